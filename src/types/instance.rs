//! A single resource's persisted state.

use serde::{Deserialize, Serialize};

use super::{path, FlatMap};

/// Persisted state of one resource instance.
///
/// `id` is the resource's canonical external identifier. Once set, the
/// reserved `id` attribute mirrors it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Canonical external identifier.
    #[serde(default)]
    pub id: String,
    /// Flattened attributes.
    #[serde(default)]
    pub attributes: FlatMap,
}

impl InstanceState {
    /// Create a state from an identifier and attributes.
    pub fn new(id: impl Into<String>, attributes: FlatMap) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Whether there is no resource state at all.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Set the canonical identifier and mirror it into the `id` attribute.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        self.sync_id_attribute();
    }

    /// Write `id` into the reserved attribute. An empty id is left alone.
    pub fn sync_id_attribute(&mut self) {
        if !self.id.is_empty() {
            self.attributes.insert(path::ID_KEY, self.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_id_mirrors_attribute() {
        let mut state = InstanceState::new("", FlatMap::from_iter([("name", "vmss")]));
        state.set_id("/subscriptions/x/vmss");
        assert_eq!(state.attributes.get("id"), Some("/subscriptions/x/vmss"));
    }

    #[test]
    fn test_sync_skips_empty_id() {
        let mut state = InstanceState::new("", FlatMap::from_iter([("name", "vmss")]));
        state.sync_id_attribute();
        assert!(!state.attributes.contains_key("id"));
    }

    #[test]
    fn test_emptiness_follows_attributes() {
        assert!(InstanceState::new("some_id", FlatMap::new()).is_empty());
        assert!(!InstanceState::new("", FlatMap::from_iter([("a", "b")])).is_empty());
    }
}
