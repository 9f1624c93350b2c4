//! CBOR serializer: compact binary alternative to JSON.

use common::{DeserializationError, SerializationError};
use serde::{de::DeserializeOwned, Serialize};

use super::Serializer;

/// Serializes values as CBOR via `ciborium`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborSerializer;

impl Serializer for CborSerializer {
    fn id(&self) -> &'static str {
        "cbor"
    }

    fn dump<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).map_err(SerializationError::new)?;
        Ok(buf)
    }

    fn load<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DeserializationError> {
        ciborium::from_reader(bytes).map_err(DeserializationError::new)
    }
}
