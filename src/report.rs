//! Per-step migration reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::InstanceState;

/// What one driver call did to a state.
///
/// Fingerprints identify the exact state before and after without
/// carrying its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Correlates log lines of one call.
    pub run_id: Uuid,
    /// Stored version the call started from.
    pub from_version: u32,
    /// Version of the returned state.
    pub to_version: u32,
    /// Kind of step applied, `None` on the empty-state fast path.
    pub step: Option<String>,
    /// Fingerprint of the input state.
    pub before_fingerprint: String,
    /// Fingerprint of the output state.
    pub after_fingerprint: String,
    /// Attribute count before.
    pub keys_before: usize,
    /// Attribute count after.
    pub keys_after: usize,
    /// When the call finished.
    pub completed_at: DateTime<Utc>,
}

impl StepReport {
    pub(crate) fn new(
        run_id: Uuid,
        from_version: u32,
        to_version: u32,
        step: Option<&str>,
        before: &InstanceState,
        after: &InstanceState,
    ) -> Self {
        Self {
            run_id,
            from_version,
            to_version,
            step: step.map(str::to_string),
            before_fingerprint: before.attributes.fingerprint(),
            after_fingerprint: after.attributes.fingerprint(),
            keys_before: before.attributes.len(),
            keys_after: after.attributes.len(),
            completed_at: Utc::now(),
        }
    }

    /// Whether the attributes came out unchanged.
    pub fn is_unchanged(&self) -> bool {
        self.before_fingerprint == self.after_fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlatMap;

    #[test]
    fn test_unchanged_report() {
        let state = InstanceState::new("id", FlatMap::from_iter([("a", "1")]));
        let report = StepReport::new(Uuid::nil(), 1, 1, None, &state, &state);
        assert!(report.is_unchanged());
        assert_eq!(report.keys_before, 1);
    }

    #[test]
    fn test_changed_report() {
        let before = InstanceState::new("id", FlatMap::from_iter([("a", "1")]));
        let after = InstanceState::new("id", FlatMap::from_iter([("b", "1")]));
        let report = StepReport::new(Uuid::nil(), 1, 2, Some("reshape"), &before, &after);
        assert!(!report.is_unchanged());
        assert_eq!(report.step.as_deref(), Some("reshape"));
    }
}
