//! YAML serializer.

use common::{DeserializationError, SerializationError};
use serde::{de::DeserializeOwned, Serialize};

use super::Serializer;

/// Serializes values as YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSerializer;

impl Serializer for YamlSerializer {
    fn id(&self) -> &'static str {
        "yaml"
    }

    fn dump<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(SerializationError::new)
    }

    fn load<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DeserializationError> {
        serde_yaml::from_slice(bytes).map_err(DeserializationError::new)
    }
}
