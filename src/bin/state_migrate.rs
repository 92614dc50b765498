//! State Migration Binary
//!
//! Upgrades one persisted scale set state to the latest schema version,
//! applying one step per driver call.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `STATE_FILE`: JSON `{"id": ..., "attributes": {...}}` to migrate (required)
//! - `STATE_VERSION`: Stored schema version of that state (default: 0)
//! - `LOOKUP_FILE`: JSON array of `{"resource_group", "name", "id"}` records
//!   answering canonical identifier lookups (default: none)
//! - `STATE_MIGRATE_LOG_ATTRIBUTES`, `STATE_MIGRATE_LOOKUP_CACHE_SIZE`: see `MigratorConfig`
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! Logs go to stderr; the migrated state is printed to stdout.
//!
//! ## Usage
//!
//! ```bash
//! STATE_FILE=state.json STATE_VERSION=1 cargo run --bin state_migrate --features cli
//! ```

use serde::Serialize;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use state_migration_kernel::lookup::LookupEntry;
use state_migration_kernel::{
    scale_set_table, InMemoryLookup, InstanceState, MigratorConfig, StateMigrator,
    UnknownVersionError,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "state_migrate=info,state_migration_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

#[derive(Serialize)]
struct Output<'a> {
    version: u32,
    state: &'a InstanceState,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let state_file = std::env::var("STATE_FILE").map_err(|_| "STATE_FILE is required")?;
    let mut version: u32 = match std::env::var("STATE_VERSION") {
        Ok(raw) => raw.parse().map_err(|e| format!("invalid STATE_VERSION {raw:?}: {e}"))?,
        Err(_) => 0,
    };

    let mut state: InstanceState = serde_json::from_str(&std::fs::read_to_string(&state_file)?)?;

    let lookup: InMemoryLookup = match std::env::var("LOOKUP_FILE") {
        Ok(path) => {
            let entries: Vec<LookupEntry> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
            entries.into_iter().collect()
        }
        Err(_) => InMemoryLookup::new(),
    };

    let config = MigratorConfig::from_env();
    let migrator = StateMigrator::cached(lookup, scale_set_table(), config);

    info!(
        state_file = %state_file,
        from = version,
        latest = migrator.latest(),
        "Starting state migration"
    );

    if version > migrator.latest() {
        return Err(UnknownVersionError {
            version,
            latest: migrator.latest(),
        }
        .into());
    }

    while version < migrator.latest() {
        state = migrator.migrate(version, &state).await?;
        version += 1;
    }

    println!("{}", serde_json::to_string_pretty(&Output { version, state: &state })?);

    info!(version, "State migration complete");
    Ok(())
}
