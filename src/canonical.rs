//! Canonical serialization for state fingerprints.
//!
//! Fingerprints let a migration log prove which exact state went in and
//! which came out without dumping the attributes themselves.
//!
//! ## Determinism Guarantees
//!
//! - `FlatMap` is backed by a `BTreeMap`, so keys serialize in sorted order
//! - Struct fields serialize in declaration order
//! - No HashMap allowed in fingerprinted data

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("state values serialize to JSON")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
