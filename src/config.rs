//! Migrator configuration.
//!
//! ## Environment
//!
//! - `STATE_MIGRATE_LOG_ATTRIBUTES`: `true` to dump attributes at debug level
//!   before and after every step (default: false; states can carry key material)
//! - `STATE_MIGRATE_LOOKUP_CACHE_SIZE`: lookup cache capacity, `0` disables it
//!   (default: 1000)

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lookup::CacheConfig;

/// Environment variable enabling attribute dumps.
pub const ENV_LOG_ATTRIBUTES: &str = "STATE_MIGRATE_LOG_ATTRIBUTES";

/// Environment variable sizing the lookup cache.
pub const ENV_LOOKUP_CACHE_SIZE: &str = "STATE_MIGRATE_LOOKUP_CACHE_SIZE";

/// Configuration for a [`StateMigrator`](crate::StateMigrator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Dump full attribute maps at debug level around each step.
    pub log_attributes: bool,
    /// Lookup cache configuration, applied by
    /// [`StateMigrator::cached`](crate::StateMigrator::cached).
    pub lookup_cache: CacheConfig,
}

impl MigratorConfig {
    /// Read configuration from the process environment.
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `var`, which returns the value of an environment key.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = var(ENV_LOG_ATTRIBUTES) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.log_attributes = true,
                "0" | "false" | "no" | "" => config.log_attributes = false,
                other => warn!(key = ENV_LOG_ATTRIBUTES, value = other, "ignoring invalid boolean"),
            }
        }

        if let Some(raw) = var(ENV_LOOKUP_CACHE_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.lookup_cache.enabled = false,
                Ok(n) => {
                    config.lookup_cache.enabled = true;
                    config.lookup_cache.max_entries = n;
                }
                Err(_) => warn!(key = ENV_LOOKUP_CACHE_SIZE, value = %raw, "ignoring invalid cache size"),
            }
        }

        config
    }
}
