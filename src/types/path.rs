//! Flat attribute path grammar.
//!
//! Keys in a [`FlatMap`](super::FlatMap) are dotted paths:
//!
//! ```text
//! network_profile.#                                  -> "1"
//! network_profile.2270531745.name                    -> "acc-network"
//! network_profile.2270531745.ip_configuration.0.name -> "acc-test"
//! ```
//!
//! A numeric segment is either a list index (stable) or a set member
//! identifier (content-derived). The `#` segment holds the cardinality of
//! the collection at that prefix.

/// Segment separator.
pub const SEPARATOR: char = '.';

/// Segment holding the cardinality of a list or set.
pub const COUNT_SEGMENT: &str = "#";

/// Segment holding the cardinality of a nested map.
pub const MAP_COUNT_SEGMENT: &str = "%";

/// Reserved top-level key mirroring the resource's canonical identifier.
pub const ID_KEY: &str = "id";

/// Join a prefix and a relative path.
///
/// An empty side is dropped, so joining onto the root yields the other side.
pub fn join(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}{SEPARATOR}{rest}"),
    }
}

/// Key of the cardinality entry for the collection at `prefix`.
pub fn count_key(prefix: &str) -> String {
    join(prefix, COUNT_SEGMENT)
}

/// Strip `prefix` from `key`, returning the path relative to it.
///
/// Returns `None` unless `key` is strictly below `prefix` on a segment boundary
/// (`network_profile` does not own `network_profile_name.0`).
pub fn relative<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(key);
    }
    key.strip_prefix(prefix)?.strip_prefix(SEPARATOR)
}

/// Split off the first segment of a relative path.
pub fn split_first(path: &str) -> (&str, &str) {
    match path.split_once(SEPARATOR) {
        Some((head, tail)) => (head, tail),
        None => (path, ""),
    }
}

/// Whether a segment is a collection bookkeeping segment (`#` or `%`).
pub fn is_count_segment(segment: &str) -> bool {
    segment == COUNT_SEGMENT || segment == MAP_COUNT_SEGMENT
}
