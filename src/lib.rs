//! # state-migration-kernel
//!
//! Deterministic migration of flattened resource state across schema versions.
//!
//! A resource's persisted state is a flat map of dotted-path keys to string
//! values. Nested objects, lists and sets all live in that one map; members
//! of unordered sets are addressed by an identifier derived from their
//! content. When a schema version changes the key layout or the identifier
//! contract, every affected key has to be rewritten.
//!
//! ## Core Contract
//!
//! 1. Given a stored version and a state, apply exactly one step (`v` → `v + 1`)
//! 2. Keys no rule touches pass through byte-identical
//! 3. An empty state is never migrated; an unknown version is rejected
//! 4. On failure the caller's state is untouched
//!
//! ## Architecture
//!
//! ```text
//! (version, InstanceState) → StateMigrator → MigrationTable[version]
//!                                               ├─ AdoptIdentifier → ResourceLookup
//!                                               ├─ Reshape → PathRewriter → SetHasher
//!                                               └─ Reencode → SchemaCodec
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same content + same hash scheme → same set member identifier
//! - Rewrite rules run in declared order
//! - `FlatMap` iterates and serializes in key order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod hashing;
pub mod rewrite;
pub mod step;
pub mod driver;
pub mod lookup;
pub mod codec;
pub mod config;
pub mod error;
pub mod report;
pub mod canonical;
pub mod resources;

// Re-exports
pub use types::{FlatMap, InstanceState};
pub use hashing::{hash_string, HashField, SetHasher, SetMember, SET_HASH_SCHEME_VERSION};
pub use rewrite::{PathRewriter, RewriteRule};
pub use step::{IdentifierAdoption, MigrationStep, MigrationTable};
pub use driver::StateMigrator;
pub use lookup::{CanonicalRecord, ResourceLookup, InMemoryLookup, CachingLookup, CacheConfig};
pub use codec::SchemaCodec;
pub use config::MigratorConfig;
pub use error::{MigrationError, UnknownVersionError, LookupError, EmptyIdentifierError, CodecError};
pub use report::StepReport;
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use resources::{scale_set_table, SCALE_SET_RESOURCE, SCALE_SET_SCHEMA_VERSION};
