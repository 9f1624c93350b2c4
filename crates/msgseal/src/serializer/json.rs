//! JSON serializer, the default format.

use common::{DeserializationError, SerializationError};
use serde::{de::DeserializeOwned, Serialize};

use super::Serializer;

/// Serializes values as compact JSON via `serde_json`.
///
/// Struct fields keep declaration order, so a given value always produces the
/// same bytes. Use `BTreeMap` rather than `HashMap` for maps that must sign
/// identically across processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn id(&self) -> &'static str {
        "json"
    }

    fn dump<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        serde_json::to_vec(value).map_err(SerializationError::new)
    }

    fn load<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DeserializationError> {
        serde_json::from_slice(bytes).map_err(DeserializationError::new)
    }
}
