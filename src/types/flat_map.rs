//! The flattened attribute map.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use super::path;
use crate::canonical::canonical_hash_hex;

/// A tree of scalars, lists and sets flattened into dotted-path keys.
///
/// Backed by a `BTreeMap` so iteration, prefix scans and serialized output
/// are in canonical key order. Absent keys are never an error: lookups
/// return `None` and prefix operations over an absent prefix do nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatMap(BTreeMap<String, String>);

impl FlatMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the map holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Look up a key, treating an absent key as the empty string.
    pub fn get_or_default(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or overwrite a key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a single key.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Iterate all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate all keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate entries strictly below `prefix`, yielding full keys.
    pub fn scan_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let start = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}{}", path::SEPARATOR)
        };
        self.0
            .range::<str, _>((Bound::Included(start.as_str()), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(start.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether any key lives strictly below `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.scan_prefix(prefix).next().is_some()
    }

    /// Copy of everything below `prefix`, with the prefix stripped.
    pub fn subtree(&self, prefix: &str) -> FlatMap {
        self.scan_prefix(prefix)
            .filter_map(|(k, v)| path::relative(prefix, k).map(|rel| (rel.to_string(), v.to_string())))
            .collect()
    }

    /// Remove everything below `prefix` and return it with the prefix stripped.
    pub fn take_subtree(&mut self, prefix: &str) -> FlatMap {
        let keys: Vec<String> = self.scan_prefix(prefix).map(|(k, _)| k.to_string()).collect();
        let mut taken = FlatMap::new();
        for key in keys {
            if let Some(value) = self.0.remove(&key) {
                if let Some(rel) = path::relative(prefix, &key) {
                    taken.insert(rel, value);
                }
            }
        }
        taken
    }

    /// Remove every key below `prefix`. Returns the number of keys removed.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        self.take_subtree(prefix).len()
    }

    /// Write every entry of `subtree` below `prefix`.
    pub fn insert_subtree(&mut self, prefix: &str, subtree: FlatMap) {
        for (rel, value) in subtree.0 {
            self.0.insert(path::join(prefix, &rel), value);
        }
    }

    /// Declared cardinality of the collection at `prefix` (the `#` entry).
    pub fn count(&self, prefix: &str) -> Option<&str> {
        self.get(&path::count_key(prefix))
    }

    /// Distinct first segments below `prefix`, excluding `#` and `%`.
    ///
    /// For a list these are the indices, for a set the member identifiers.
    pub fn member_ids(&self, prefix: &str) -> BTreeSet<String> {
        self.scan_prefix(prefix)
            .filter_map(|(k, _)| path::relative(prefix, k))
            .map(|rel| path::split_first(rel).0)
            .filter(|segment| !path::is_count_segment(segment))
            .map(str::to_string)
            .collect()
    }

    /// Stable fingerprint of the whole map (xxh64 over canonical JSON).
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }

    /// Consume the wrapper and return the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for FlatMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FlatMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for FlatMap {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
