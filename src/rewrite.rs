//! Relocation of flat sub-trees between key layouts.
//!
//! A [`RewriteRule`] describes how one prefix's internal shape changed
//! between two schema versions. [`PathRewriter`] applies an ordered list of
//! rules to a copy of the input map:
//!
//! ```text
//! old: network_profile.123451312.ip_configuration.0.application_security_group_ids.2391800824 = common-asg
//! new: network_profile.2270531745.ip_configuration.0.application_security_group_ids.3894836646 = common-asg
//! ```
//!
//! ## Guarantees
//!
//! - Copy then discard: after a rule runs, no key of the old layout remains
//!   under its source prefix.
//! - Keys outside every rule pass through byte-identical.
//! - An absent source prefix is a silent no-op.
//! - List indices are kept; set members get new identifiers but the `#`
//!   cardinality entry is copied unchanged.
//! - Nested rules run against a member after its new identifier has been
//!   computed, so nothing is ever written below a stale parent identifier.

use std::collections::BTreeSet;

use crate::error::MigrationError;
use crate::hashing::{SetHasher, SetMember};
use crate::types::{path, FlatMap};

/// One structural change between two key layouts.
///
/// Paths of nested rules are relative to the list element or set member
/// they apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// Move a single value.
    RenameScalar {
        /// Old key.
        from: String,
        /// New key.
        to: String,
    },
    /// Move an ordered collection, keeping indices.
    List {
        /// Old prefix.
        from: String,
        /// New prefix.
        to: String,
        /// Rules applied inside every element.
        elements: Vec<RewriteRule>,
    },
    /// Move an unordered collection, recomputing member identifiers.
    Set {
        /// Old prefix.
        from: String,
        /// New prefix.
        to: String,
        /// Identifier contract of the new layout.
        hasher: SetHasher,
        /// Rules applied inside every member.
        members: Vec<RewriteRule>,
    },
}

impl RewriteRule {
    /// Move the value at `from` to `to`.
    pub fn rename_scalar(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RenameScalar {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Move the list at `from` to `to`.
    pub fn list(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::List {
            from: from.into(),
            to: to.into(),
            elements: Vec::new(),
        }
    }

    /// Move the set at `from` to `to`, re-identifying members with `hasher`.
    pub fn set(from: impl Into<String>, to: impl Into<String>, hasher: SetHasher) -> Self {
        Self::Set {
            from: from.into(),
            to: to.into(),
            hasher,
            members: Vec::new(),
        }
    }

    /// Re-identify the set at `prefix` in place.
    pub fn rehash(prefix: impl Into<String>, hasher: SetHasher) -> Self {
        let prefix = prefix.into();
        Self::set(prefix.clone(), prefix, hasher)
    }

    /// Attach rules applied inside every element or member.
    ///
    /// Has no effect on a scalar rename.
    pub fn with_nested(mut self, nested: impl IntoIterator<Item = RewriteRule>) -> Self {
        match &mut self {
            Self::List { elements, .. } => elements.extend(nested),
            Self::Set { members, .. } => members.extend(nested),
            Self::RenameScalar { .. } => {}
        }
        self
    }

    /// Source prefix or key of this rule.
    pub fn source(&self) -> &str {
        match self {
            Self::RenameScalar { from, .. } | Self::List { from, .. } | Self::Set { from, .. } => from,
        }
    }
}

/// Applies an ordered list of rewrite rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRewriter {
    rules: Vec<RewriteRule>,
}

impl PathRewriter {
    /// Create a rewriter; rules run in the given order.
    pub fn new(rules: impl IntoIterator<Item = RewriteRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// The declared rules.
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Produce the rewritten copy of `source`. `source` is not modified.
    pub fn apply(&self, source: &FlatMap) -> Result<FlatMap, MigrationError> {
        let mut out = source.clone();
        apply_rules(&mut out, &self.rules, "")?;
        Ok(out)
    }
}

/// Move the value at `from` to `to`. Absent `from` is a no-op.
pub fn rename_scalar(map: &mut FlatMap, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        map.insert(to, value);
    }
}

/// Move the list at `from` to `to`, keeping indices.
pub fn rewrite_list(map: &mut FlatMap, from: &str, to: &str) -> Result<(), MigrationError> {
    apply_rule(map, &RewriteRule::list(from, to), "")
}

/// Move the set at `from` to `to`, recomputing every member identifier.
pub fn rewrite_set(map: &mut FlatMap, from: &str, to: &str, hasher: &SetHasher) -> Result<(), MigrationError> {
    apply_rule(map, &RewriteRule::set(from, to, hasher.clone()), "")
}

fn apply_rules(map: &mut FlatMap, rules: &[RewriteRule], context: &str) -> Result<(), MigrationError> {
    for rule in rules {
        apply_rule(map, rule, context)?;
    }
    Ok(())
}

/// `context` is the absolute location of `map` inside the full state, for errors.
fn apply_rule(map: &mut FlatMap, rule: &RewriteRule, context: &str) -> Result<(), MigrationError> {
    match rule {
        RewriteRule::RenameScalar { from, to } => {
            rename_scalar(map, from, to);
            Ok(())
        }
        RewriteRule::List { from, to, elements } => {
            if !map.has_prefix(from) {
                return Ok(());
            }
            let mut list = map.take_subtree(from);
            if !elements.is_empty() {
                let location = path::join(context, from);
                for index in list.member_ids("") {
                    let mut element = list.take_subtree(&index);
                    apply_rules(&mut element, elements, &path::join(&location, &index))?;
                    list.insert_subtree(&index, element);
                }
            }
            map.insert_subtree(to, list);
            Ok(())
        }
        RewriteRule::Set { from, to, hasher, members } => {
            if !map.has_prefix(from) {
                return Ok(());
            }
            let location = path::join(context, from);
            let set = map.take_subtree(from);
            let rewritten = rehash_members(&set, hasher, members, &location)?;
            map.insert_subtree(to, rewritten);
            Ok(())
        }
    }
}

fn rehash_members(
    set: &FlatMap,
    hasher: &SetHasher,
    nested: &[RewriteRule],
    location: &str,
) -> Result<FlatMap, MigrationError> {
    let ids = set.member_ids("");
    let declared = set.get(path::COUNT_SEGMENT);

    if let Some(declared) = declared {
        if declared.parse::<usize>().ok() != Some(ids.len()) {
            return Err(MigrationError::Inconsistent {
                prefix: location.to_string(),
                declared: declared.to_string(),
                found: ids.len(),
            });
        }
    }

    let mut rewritten = FlatMap::new();
    if let Some(declared) = declared {
        rewritten.insert(path::COUNT_SEGMENT, declared);
    }

    let mut assigned: BTreeSet<u32> = BTreeSet::new();
    for id in &ids {
        check_member_shape(set, id, hasher, location)?;
        let member = SetMember::read(set, id, hasher);
        let new_id = hasher.hash(&member);
        if !assigned.insert(new_id) {
            return Err(MigrationError::IdentifierCollision {
                prefix: location.to_string(),
                identifier: new_id,
            });
        }

        let segment = new_id.to_string();
        let member = match member {
            SetMember::Object(mut content) if !nested.is_empty() => {
                apply_rules(&mut content, nested, &path::join(location, &segment))?;
                SetMember::Object(content)
            }
            other => other,
        };
        member.write(&mut rewritten, &segment);
    }

    Ok(rewritten)
}

/// A string member must be a bare value and an object member must not be,
/// otherwise reading the member would drop keys.
fn check_member_shape(set: &FlatMap, id: &str, hasher: &SetHasher, location: &str) -> Result<(), MigrationError> {
    let expected = match hasher {
        SetHasher::StringValue if set.has_prefix(id) => "string",
        SetHasher::Fields(_) if set.contains_key(id) => "object",
        _ => return Ok(()),
    };
    Err(MigrationError::MemberShape {
        prefix: location.to_string(),
        member: id.to_string(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashField;

    fn network_hasher() -> SetHasher {
        SetHasher::fields([HashField::scalar("name"), HashField::scalar("primary").or("false")])
    }

    #[test]
    fn test_rename_scalar() {
        let mut map = FlatMap::from_iter([("old", "v"), ("other", "x")]);
        rename_scalar(&mut map, "old", "new");
        assert_eq!(map.get("new"), Some("v"));
        assert!(!map.contains_key("old"));
        assert_eq!(map.get("other"), Some("x"));
    }

    #[test]
    fn test_rename_absent_scalar_is_noop() {
        let mut map = FlatMap::from_iter([("other", "x")]);
        rename_scalar(&mut map, "old", "new");
        assert_eq!(map, FlatMap::from_iter([("other", "x")]));
    }

    #[test]
    fn test_rewrite_list_keeps_indices() {
        let mut map = FlatMap::from_iter([
            ("dns.#", "2"),
            ("dns.0", "10.0.0.1"),
            ("dns.1", "10.0.0.2"),
            ("dnsx", "keep"),
        ]);
        rewrite_list(&mut map, "dns", "dns_servers").unwrap();
        assert_eq!(
            map,
            FlatMap::from_iter([
                ("dns_servers.#", "2"),
                ("dns_servers.0", "10.0.0.1"),
                ("dns_servers.1", "10.0.0.2"),
                ("dnsx", "keep"),
            ])
        );
    }

    #[test]
    fn test_rewrite_string_set_recomputes_ids_and_keeps_count() {
        let mut map = FlatMap::from_iter([
            ("asg.#", "3"),
            ("asg.2391800824", "common-asg"),
            ("asg.3040429762", "another-asg"),
            ("asg.617424955", "one-more-asg"),
        ]);
        rewrite_set(&mut map, "asg", "asg", &SetHasher::StringValue).unwrap();
        assert_eq!(
            map,
            FlatMap::from_iter([
                ("asg.#", "3"),
                ("asg.3894836646", "common-asg"),
                ("asg.835205686", "another-asg"),
                ("asg.2321610563", "one-more-asg"),
            ])
        );
    }

    #[test]
    fn test_absent_set_is_noop() {
        let source = FlatMap::from_iter([("name", "x")]);
        let out = PathRewriter::new([RewriteRule::rehash("asg", SetHasher::StringValue)])
            .apply(&source)
            .unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_empty_set_keeps_zero_count() {
        let source = FlatMap::from_iter([("asg.#", "0")]);
        let out = PathRewriter::new([RewriteRule::rehash("asg", SetHasher::StringValue)])
            .apply(&source)
            .unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_nested_set_inside_list_inside_set() {
        let source = FlatMap::from_iter([
            ("net.#", "1"),
            ("net.123451312.name", "acc-network"),
            ("net.123451312.primary", "true"),
            ("net.123451312.ipc.#", "1"),
            ("net.123451312.ipc.0.name", "acc-test"),
            ("net.123451312.ipc.0.ids.#", "2"),
            ("net.123451312.ipc.0.ids.147218285", "backend_lb_id"),
            ("net.123451312.ipc.0.ids.4138848892", "backend_lb_id2"),
            ("unrelated", "same"),
        ]);
        let rewriter = PathRewriter::new([RewriteRule::rehash("net", network_hasher()).with_nested([
            RewriteRule::list("ipc", "ipc").with_nested([RewriteRule::rehash("ids", SetHasher::StringValue)]),
        ])]);

        let out = rewriter.apply(&source).unwrap();

        assert_eq!(
            out,
            FlatMap::from_iter([
                ("net.#", "1"),
                ("net.2270531745.name", "acc-network"),
                ("net.2270531745.primary", "true"),
                ("net.2270531745.ipc.#", "1"),
                ("net.2270531745.ipc.0.name", "acc-test"),
                ("net.2270531745.ipc.0.ids.#", "2"),
                ("net.2270531745.ipc.0.ids.927210270", "backend_lb_id"),
                ("net.2270531745.ipc.0.ids.3773679477", "backend_lb_id2"),
                ("unrelated", "same"),
            ])
        );
        // input untouched
        assert!(source.contains_key("net.123451312.name"));
    }

    #[test]
    fn test_declared_count_mismatch_is_inconsistent() {
        let source = FlatMap::from_iter([("asg.#", "2"), ("asg.1", "a")]);
        let err = PathRewriter::new([RewriteRule::rehash("asg", SetHasher::StringValue)])
            .apply(&source)
            .unwrap_err();
        match err {
            MigrationError::Inconsistent { prefix, declared, found } => {
                assert_eq!(prefix, "asg");
                assert_eq!(declared, "2");
                assert_eq!(found, 1);
            }
            other => panic!("Expected Inconsistent, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_error_reports_absolute_location() {
        let source = FlatMap::from_iter([
            ("net.#", "1"),
            ("net.5.name", "n"),
            ("net.5.ids.#", "3"),
            ("net.5.ids.1", "a"),
        ]);
        let rewriter = PathRewriter::new([RewriteRule::rehash("net", SetHasher::fields([HashField::scalar("name")]))
            .with_nested([RewriteRule::rehash("ids", SetHasher::StringValue)])]);
        let err = rewriter.apply(&source).unwrap_err();
        let new_id = crate::hashing::hash_string("n-");
        assert!(err.to_string().contains(&format!("net.{new_id}.ids")));
    }

    #[test]
    fn test_duplicate_content_is_a_collision() {
        let source = FlatMap::from_iter([("asg.#", "2"), ("asg.1", "a"), ("asg.2", "a")]);
        let err = PathRewriter::new([RewriteRule::rehash("asg", SetHasher::StringValue)])
            .apply(&source)
            .unwrap_err();
        assert!(matches!(err, MigrationError::IdentifierCollision { .. }));
    }

    #[test]
    fn test_string_member_with_sub_keys_is_rejected() {
        let source = FlatMap::from_iter([("ids.#", "1"), ("ids.5", "a"), ("ids.5.extra", "b")]);
        let err = PathRewriter::new([RewriteRule::rehash("ids", SetHasher::StringValue)])
            .apply(&source)
            .unwrap_err();
        match &err {
            MigrationError::MemberShape { prefix, member, expected } => {
                assert_eq!(prefix, "ids");
                assert_eq!(member, "5");
                assert_eq!(*expected, "string");
            }
            other => panic!("Expected MemberShape error, got {other:?}"),
        }
        assert!(err.is_internal());
    }

    #[test]
    fn test_object_member_with_bare_value_is_rejected() {
        let source = FlatMap::from_iter([("net.#", "2"), ("net.5", "x"), ("net.6.name", "n")]);
        let err = PathRewriter::new([RewriteRule::rehash("net", network_hasher())])
            .apply(&source)
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MemberShape { ref member, expected: "object", .. } if member == "5"
        ));
    }

    #[test]
    fn test_rules_run_in_declared_order() {
        let source = FlatMap::from_iter([("a", "1")]);
        let out = PathRewriter::new([RewriteRule::rename_scalar("a", "b"), RewriteRule::rename_scalar("b", "c")])
            .apply(&source)
            .unwrap();
        assert_eq!(out, FlatMap::from_iter([("c", "1")]));
    }

    #[test]
    fn test_with_nested_on_scalar_is_ignored() {
        let rule = RewriteRule::rename_scalar("a", "b").with_nested([RewriteRule::rename_scalar("x", "y")]);
        assert_eq!(rule, RewriteRule::rename_scalar("a", "b"));
        assert_eq!(rule.source(), "a");
    }
}
