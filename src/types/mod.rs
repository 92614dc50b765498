//! Core types for the state migration kernel.

pub mod path;
pub mod flat_map;
pub mod instance;

pub use flat_map::FlatMap;
pub use instance::InstanceState;
