//! Content-derived identifiers for set members.
//!
//! ## Purpose
//!
//! Members of an unordered set are addressed in a [`FlatMap`] by an
//! identifier derived from their content:
//!
//! ```text
//! ...application_security_group_ids.3894836646 = "common-asg"
//! ```
//!
//! Which content participates, in what order, and how absent values are
//! written is a versioned contract. Changing any of it changes every
//! identifier in every stored state, so it only ever changes together with
//! a migration step that re-hashes the affected sets.
//!
//! ## Set Hash Contract (scheme 2)
//!
//! ```text
//! identifier(member) = CRC32_IEEE(UTF-8(hash_input(member)))
//! ```
//!
//! Where `hash_input` is:
//! - **String members**: the string value, byte for byte.
//! - **Object members**: for each declared field, in declared order,
//!   the field's rendering followed by `-`:
//!   - scalar: the value, or the field's sentinel when absent (default `""`)
//!   - string set: `[v1 v2 ...]` with members ordered by their own
//!     string identifier, `[]` when absent
//!   - list: `[v0 v1 ...]` in index order, `[]` when absent
//!
//! Values are never trimmed or normalized. Multi-line key material hashes
//! exactly as stored.

use std::fmt;

use crate::types::{path, FlatMap};

/// Version of the set hash contract implemented here.
///
/// Increment this when [`SetHasher`] semantics change; that change needs a
/// migration step re-hashing every affected set.
pub const SET_HASH_SCHEME_VERSION: u32 = 2;

/// CRC-32 (IEEE) of a string, used as a member identifier.
pub fn hash_string(value: &str) -> u32 {
    crc32fast::hash(value.as_bytes())
}

/// Content of a single set member, read out of a flat map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetMember {
    /// Member of a set of strings: `prefix.<id> = value`.
    Value(String),
    /// Member of a set of objects: everything under `prefix.<id>.`, prefix stripped.
    Object(FlatMap),
}

impl SetMember {
    /// Read member `id` of the set whose entries are `set` (prefix stripped).
    pub fn read(set: &FlatMap, id: &str, hasher: &SetHasher) -> Self {
        match hasher {
            SetHasher::StringValue => Self::Value(set.get_or_default(id).to_string()),
            SetHasher::Fields(_) => Self::Object(set.subtree(id)),
        }
    }

    /// Emit the member below `prefix` into `target`.
    pub fn write(self, target: &mut FlatMap, prefix: &str) {
        match self {
            Self::Value(value) => {
                target.insert(prefix, value);
            }
            Self::Object(content) => target.insert_subtree(prefix, content),
        }
    }
}

/// How a member field contributes to the hash input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single value.
    Scalar,
    /// Nested set of strings.
    StringSet,
    /// Nested list of strings.
    List,
}

/// One participating field of an object member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashField {
    /// Path of the field relative to the member.
    pub path: String,
    /// How the field is rendered.
    pub kind: FieldKind,
    /// Rendering used when the field is absent.
    pub sentinel: String,
}

impl HashField {
    /// A scalar field; absent renders as `""`.
    pub fn scalar(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldKind::Scalar,
            sentinel: String::new(),
        }
    }

    /// A nested string set; absent renders as `[]`.
    pub fn string_set(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldKind::StringSet,
            sentinel: "[]".to_string(),
        }
    }

    /// A nested list of strings; absent renders as `[]`.
    pub fn list(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldKind::List,
            sentinel: "[]".to_string(),
        }
    }

    /// Override the absent-value rendering.
    pub fn or(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    fn render(&self, member: &FlatMap) -> String {
        match self.kind {
            FieldKind::Scalar => member
                .get(&self.path)
                .map(str::to_string)
                .unwrap_or_else(|| self.sentinel.clone()),
            FieldKind::StringSet => {
                if !self.present(member) {
                    return self.sentinel.clone();
                }
                let mut values: Vec<&str> = member
                    .member_ids(&self.path)
                    .iter()
                    .map(|id| member.get_or_default(&path::join(&self.path, id)))
                    .collect();
                values.sort_by(|a, b| hash_string(a).cmp(&hash_string(b)).then_with(|| a.cmp(b)));
                bracketed(&values)
            }
            FieldKind::List => {
                if !self.present(member) {
                    return self.sentinel.clone();
                }
                let mut indexed: Vec<(u64, &str)> = member
                    .member_ids(&self.path)
                    .iter()
                    .filter_map(|idx| {
                        let value = member.get_or_default(&path::join(&self.path, idx));
                        idx.parse::<u64>().ok().map(|i| (i, value))
                    })
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                let values: Vec<&str> = indexed.into_iter().map(|(_, v)| v).collect();
                bracketed(&values)
            }
        }
    }

    fn present(&self, member: &FlatMap) -> bool {
        member.has_prefix(&self.path)
    }
}

fn bracketed(values: &[&str]) -> String {
    format!("[{}]", values.join(" "))
}

/// Hash contract for the members of one set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetHasher {
    /// Members are strings hashed by value.
    StringValue,
    /// Members are objects hashed over the declared fields, in order.
    Fields(Vec<HashField>),
}

impl SetHasher {
    /// Object hasher over the given fields.
    pub fn fields(fields: impl IntoIterator<Item = HashField>) -> Self {
        Self::Fields(fields.into_iter().collect())
    }

    /// The exact string fed to CRC-32 for `member`.
    ///
    /// Total over any content: a value member under a field hasher renders
    /// every field as absent, an object member under the string hasher
    /// renders as `""`.
    pub fn hash_input(&self, member: &SetMember) -> String {
        match (self, member) {
            (Self::StringValue, SetMember::Value(value)) => value.clone(),
            (Self::StringValue, SetMember::Object(_)) => String::new(),
            (Self::Fields(fields), SetMember::Object(content)) => render_fields(fields, content),
            (Self::Fields(fields), SetMember::Value(_)) => render_fields(fields, &FlatMap::new()),
        }
    }

    /// Identifier of `member` under this contract.
    pub fn hash(&self, member: &SetMember) -> u32 {
        hash_string(&self.hash_input(member))
    }
}

fn render_fields(fields: &[HashField], content: &FlatMap) -> String {
    let mut buf = String::new();
    for field in fields {
        buf.push_str(&field.render(content));
        buf.push('-');
    }
    buf
}

impl fmt::Display for SetHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringValue => write!(f, "string"),
            Self::Fields(fields) => {
                let names: Vec<&str> = fields.iter().map(|h| h.path.as_str()).collect();
                write!(f, "fields({})", names.join(","))
            }
        }
    }
}
