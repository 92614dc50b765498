//! Version-to-version migration steps and the transition table.
//!
//! ## State Machine
//!
//! ```text
//!   v0 --step[0]--> v1 --step[1]--> v2 ... --step[latest-1]--> latest
//! ```
//!
//! Versions are contiguous. Step `i` migrates version `i` to `i + 1`; there
//! are no shortcuts. A caller holding an old state applies steps one call
//! at a time.

use std::fmt;
use std::sync::Arc;

use crate::codec::SchemaCodec;
use crate::error::UnknownVersionError;
use crate::rewrite::PathRewriter;

/// Looks up the canonical identifier and adopts it as the state's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierAdoption {
    /// Attribute holding the resource group.
    pub resource_group_key: String,
    /// Attribute holding the resource name.
    pub name_key: String,
}

impl IdentifierAdoption {
    /// Adopt by looking up `resource_group_key` / `name_key` attributes.
    pub fn new(resource_group_key: impl Into<String>, name_key: impl Into<String>) -> Self {
        Self {
            resource_group_key: resource_group_key.into(),
            name_key: name_key.into(),
        }
    }
}

impl Default for IdentifierAdoption {
    fn default() -> Self {
        Self::new("resource_group_name", "name")
    }
}

/// One transition from version `v` to `v + 1`.
#[derive(Clone)]
pub enum MigrationStep {
    /// Fetch the canonical identifier from the lookup collaborator.
    AdoptIdentifier(IdentifierAdoption),
    /// Pure path-by-path rewrite; never touches a collaborator.
    Reshape(PathRewriter),
    /// Delegate re-encoding to the schema codec.
    Reencode(Arc<dyn SchemaCodec>),
}

impl MigrationStep {
    /// Short name used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdoptIdentifier(_) => "adopt_identifier",
            Self::Reshape(_) => "reshape",
            Self::Reencode(_) => "reencode",
        }
    }

    /// Whether the step calls the lookup collaborator.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::AdoptIdentifier(_))
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdoptIdentifier(adopt) => f.debug_tuple("AdoptIdentifier").field(adopt).finish(),
            Self::Reshape(rewriter) => f.debug_tuple("Reshape").field(&rewriter.rules().len()).finish(),
            Self::Reencode(codec) => f.debug_tuple("Reencode").field(&codec.name()).finish(),
        }
    }
}

/// Ordered transition table for one resource type.
///
/// `steps[v]` migrates version `v` to `v + 1`; the latest version is
/// `steps.len()`.
#[derive(Debug, Clone)]
pub struct MigrationTable {
    resource: String,
    steps: Vec<MigrationStep>,
}

impl MigrationTable {
    /// Build a table from steps in version order.
    pub fn new(resource: impl Into<String>, steps: impl IntoIterator<Item = MigrationStep>) -> Self {
        Self {
            resource: resource.into(),
            steps: steps.into_iter().collect(),
        }
    }

    /// Resource type the table belongs to.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Latest schema version.
    pub fn latest(&self) -> u32 {
        u32::try_from(self.steps.len()).unwrap_or(u32::MAX)
    }

    /// Step migrating `version` to `version + 1`.
    pub fn step(&self, version: u32) -> Result<&MigrationStep, UnknownVersionError> {
        usize::try_from(version)
            .ok()
            .and_then(|v| self.steps.get(v))
            .ok_or(UnknownVersionError {
                version,
                latest: self.latest(),
            })
    }

    /// Iterate `(from_version, step)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &MigrationStep)> {
        (0u32..).zip(self.steps.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::RewriteRule;

    fn table() -> MigrationTable {
        MigrationTable::new(
            "test",
            [
                MigrationStep::AdoptIdentifier(IdentifierAdoption::default()),
                MigrationStep::Reshape(PathRewriter::new([RewriteRule::rename_scalar("a", "b")])),
            ],
        )
    }

    #[test]
    fn test_latest_is_step_count() {
        assert_eq!(table().latest(), 2);
        assert_eq!(MigrationTable::new("empty", []).latest(), 0);
    }

    #[test]
    fn test_step_lookup() {
        let table = table();
        assert_eq!(table.step(0).unwrap().kind(), "adopt_identifier");
        assert_eq!(table.step(1).unwrap().kind(), "reshape");
        assert!(table.step(0).unwrap().is_external());
        assert!(!table.step(1).unwrap().is_external());
    }

    #[test]
    fn test_latest_and_beyond_are_unknown() {
        let table = table();
        assert_eq!(table.step(2).unwrap_err(), UnknownVersionError { version: 2, latest: 2 });
        assert_eq!(table.step(99).unwrap_err().version, 99);
    }

    #[test]
    fn test_iter_is_version_ordered() {
        let versions: Vec<u32> = table().iter().map(|(v, _)| v).collect();
        assert_eq!(versions, vec![0, 1]);
    }

    #[test]
    fn test_default_adoption_keys() {
        let adopt = IdentifierAdoption::default();
        assert_eq!(adopt.resource_group_key, "resource_group_name");
        assert_eq!(adopt.name_key, "name");
    }
}
