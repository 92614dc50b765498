//! Error types for state migration.
//!
//! No error is retried or swallowed inside the kernel. Every failure reaches
//! the caller with the offending version or identifying attributes attached,
//! and the caller's pre-migration state is never touched.

/// Stored schema version with no migration path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unexpected schema version: {version} (migratable versions: 0..{latest})")]
pub struct UnknownVersionError {
    /// The version the caller reported.
    pub version: u32,
    /// The latest schema version; versions `0..latest` have a step.
    pub latest: u32,
}

/// Canonical identifier lookup failed.
///
/// Not found, transient and authorization failures all surface identically.
#[derive(Debug, thiserror::Error)]
#[error("Lookup of {name:?} in resource group {resource_group:?} failed: {source}")]
pub struct LookupError {
    /// Resource group attribute used for the lookup.
    pub resource_group: String,
    /// Name attribute used for the lookup.
    pub name: String,
    /// Error returned by the lookup collaborator, verbatim.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// The lookup answered with an empty canonical identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("lookup returned an empty canonical identifier")]
pub struct EmptyIdentifierError;

/// Schema round-trip collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The flat map could not be decoded into the structured form.
    #[error("Decode failed: {0}")]
    Decode(String),
    /// The structured form could not be encoded into a flat map.
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Error returned by the migration driver.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// No step is registered for the stored version.
    #[error(transparent)]
    UnknownVersion(#[from] UnknownVersionError),
    /// Identifier adoption could not reach the canonical record.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// Schema round-trip failed.
    #[error("Schema codec error: {0}")]
    Codec(#[from] CodecError),
    /// A set's declared cardinality disagrees with its members
    /// (internal consistency violation, indicates a migration table bug).
    #[error("Set {prefix:?} declares {declared} members but {found} were found")]
    Inconsistent {
        /// Prefix of the offending set.
        prefix: String,
        /// Value of the `#` entry.
        declared: String,
        /// Number of members enumerated.
        found: usize,
    },
    /// Two members of a set were assigned the same identifier
    /// (internal consistency violation, the hash contract is too narrow).
    #[error("Set {prefix:?} maps two members to identifier {identifier}")]
    IdentifierCollision {
        /// Prefix of the offending set.
        prefix: String,
        /// The colliding identifier.
        identifier: u32,
    },
    /// A set member's keys do not have the shape its hasher expects
    /// (internal consistency violation, the rule names the wrong kind of set).
    #[error("Set member {member:?} under {prefix:?} is not a {expected} member")]
    MemberShape {
        /// Prefix of the offending set.
        prefix: String,
        /// Identifier segment of the member.
        member: String,
        /// Member kind the hasher reads: `string` or `object`.
        expected: &'static str,
    },
}

impl MigrationError {
    /// Whether this error indicates a bug in a migration table rather than bad input
    /// or an unavailable collaborator.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Inconsistent { .. } | Self::IdentifierCollision { .. } | Self::MemberShape { .. }
        )
    }
}
