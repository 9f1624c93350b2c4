//! The serializer contract and the built-in formats.
//!
//! A serializer turns values into bytes before they are signed or encrypted
//! and back again once the token has been authenticated. The verifier and
//! encryptor never inspect these bytes.
//!
//! Implementations must round-trip: `load(dump(x))` is observably equal to
//! `x` for every value they accept. A value the format cannot represent must
//! fail with [`SerializationError`]; bytes that do not describe the requested
//! type must fail with [`DeserializationError`] rather than produce a partial
//! value.

mod cbor;
mod json;
mod yaml;

pub use cbor::CborSerializer;
pub use json::JsonSerializer;
pub use yaml::YamlSerializer;

use std::{fmt, str::FromStr};

use common::{DeserializationError, SerializationError, UnsupportedAlgorithm};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Converts values to bytes and back.
pub trait Serializer: Send + Sync {
    /// Stable name of the format, mixed into every signature and tag so a
    /// token only authenticates under the serializer that produced it.
    fn id(&self) -> &'static str;

    /// Serialize `value` to bytes.
    fn dump<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializationError>;

    /// Deserialize bytes produced by [`Serializer::dump`].
    fn load<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DeserializationError>;
}

/// Built-in format chosen at runtime, e.g. from [`crate::Settings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Format {
    /// [`JsonSerializer`].
    #[default]
    Json,
    /// [`YamlSerializer`].
    Yaml,
    /// [`CborSerializer`].
    Cbor,
}

impl Format {
    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Cbor => "cbor",
        }
    }
}

impl Serializer for Format {
    fn id(&self) -> &'static str {
        match self {
            Format::Json => JsonSerializer.id(),
            Format::Yaml => YamlSerializer.id(),
            Format::Cbor => CborSerializer.id(),
        }
    }

    fn dump<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        match self {
            Format::Json => JsonSerializer.dump(value),
            Format::Yaml => YamlSerializer.dump(value),
            Format::Cbor => CborSerializer.dump(value),
        }
    }

    fn load<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DeserializationError> {
        match self {
            Format::Json => JsonSerializer.load(bytes),
            Format::Yaml => YamlSerializer.load(bytes),
            Format::Cbor => CborSerializer.load(bytes),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "cbor" => Ok(Format::Cbor),
            _ => Err(UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Format {
    type Error = UnsupportedAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
