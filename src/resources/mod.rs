//! Migration tables of concrete resource types.

pub mod scale_set;

pub use scale_set::{scale_set_table, SCALE_SET_RESOURCE, SCALE_SET_SCHEMA_VERSION};
