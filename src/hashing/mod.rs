//! Set member identifier contracts.

pub mod set_hash;

pub use set_hash::{
    hash_string, FieldKind, HashField, SetHasher, SetMember, SET_HASH_SCHEME_VERSION,
};
