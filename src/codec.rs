//! Schema round-trip collaborator.
//!
//! Some reshape steps do not rewrite path by path. They hand the whole map
//! to a component that knows the latest schema, decode it into a
//! structured value (tolerating legacy keys) and encode it back under the
//! current key scheme.

use serde_json::Value;

use crate::error::CodecError;
use crate::types::FlatMap;

/// Decodes a flat map into a structured value and back, under the latest schema.
pub trait SchemaCodec: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Decode `attributes` into the structured form. Legacy keys must be tolerated.
    fn decode(&self, attributes: &FlatMap) -> Result<Value, CodecError>;

    /// Encode the structured form under the current key scheme.
    fn encode(&self, value: &Value) -> Result<FlatMap, CodecError>;

    /// Decode then encode.
    fn round_trip(&self, attributes: &FlatMap) -> Result<FlatMap, CodecError> {
        let value = self.decode(attributes)?;
        self.encode(&value)
    }
}
