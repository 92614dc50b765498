//! In-memory canonical record lookup for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CanonicalRecord, ResourceLookup};

/// Error type for the in-memory lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryLookupError {
    /// No record registered under the given group and name.
    #[error("Resource not found: {resource_group}/{name}")]
    NotFound {
        /// Resource group searched.
        resource_group: String,
        /// Name searched.
        name: String,
    },
}

/// A record as loaded from a lookup fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupEntry {
    /// Resource group.
    pub resource_group: String,
    /// Resource name.
    pub name: String,
    /// Canonical identifier.
    pub id: String,
}

/// In-memory lookup keyed by (resource group, name).
///
/// Counts calls so tests can assert that fast paths never reach it.
#[derive(Debug, Default)]
pub struct InMemoryLookup {
    records: BTreeMap<(String, String), CanonicalRecord>,
    calls: AtomicUsize,
}

impl InMemoryLookup {
    /// Create an empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record.
    pub fn insert(&mut self, resource_group: impl Into<String>, name: impl Into<String>, record: CanonicalRecord) {
        self.records.insert((resource_group.into(), name.into()), record);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_record(
        mut self,
        resource_group: impl Into<String>,
        name: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.insert(resource_group, name, CanonicalRecord::new(id));
        self
    }

    /// Number of records.
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Number of `get` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl FromIterator<LookupEntry> for InMemoryLookup {
    fn from_iter<I: IntoIterator<Item = LookupEntry>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for entry in iter {
            lookup.insert(entry.resource_group, entry.name, CanonicalRecord::new(entry.id));
        }
        lookup
    }
}

#[async_trait]
impl ResourceLookup for InMemoryLookup {
    type Error = InMemoryLookupError;

    async fn get(&self, resource_group: &str, name: &str) -> Result<CanonicalRecord, Self::Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.records
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| InMemoryLookupError::NotFound {
                resource_group: resource_group.to_string(),
                name: name.to_string(),
            })
    }
}
