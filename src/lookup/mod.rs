//! Canonical identifier lookup backends.

pub mod memory;
pub mod cached;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Canonical representation of a resource as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Canonical external identifier.
    pub id: String,
}

impl CanonicalRecord {
    /// Create a record from its identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Trait for fetching a resource's canonical record.
///
/// The lookup is the only suspension point of a migration. Cancellation,
/// timeouts and retries belong to the implementation; the kernel surfaces
/// whatever error it returns.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// Error type for lookup operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the canonical record of `name` in `resource_group`.
    async fn get(&self, resource_group: &str, name: &str) -> Result<CanonicalRecord, Self::Error>;
}

pub use memory::{InMemoryLookup, InMemoryLookupError, LookupEntry};
pub use cached::{CacheConfig, CacheStats, CachingLookup};
