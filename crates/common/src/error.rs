//! Error taxonomy shared by the verifier and the encryptor.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error raised by a serializer implementation.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A value could not be converted to bytes by the configured serializer.
#[derive(Debug, Error)]
#[error("failed to serialize value: {0}")]
pub struct SerializationError(#[source] pub BoxError);

impl SerializationError {
    /// Wrap the serializer's own error.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }
}

/// Bytes could not be turned back into a value by the configured serializer.
///
/// Raised only after the token has been authenticated, so it signals version
/// skew or a shape mismatch rather than tampering.
#[derive(Debug, Error)]
#[error("failed to deserialize value: {0}")]
pub struct DeserializationError(#[source] pub BoxError);

impl DeserializationError {
    /// Wrap the serializer's own error.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }
}

/// A digest, cipher, or serializer name that is not supported.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

/// Top-level error type returned by every verifier and encryptor operation.
///
/// The variants fall in three classes:
/// - configuration: [`MessageError::InvalidKey`]
/// - untrusted input: [`MessageError::InvalidSignature`], [`MessageError::InvalidMessage`]
/// - content: [`MessageError::Serialization`], [`MessageError::Deserialization`]
#[derive(Debug, Error)]
pub enum MessageError {
    /// The secret is empty or has the wrong length for the chosen cipher, or
    /// the configured cipher could not seal with it.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A signed token failed its integrity check or is malformed.
    #[error("invalid signature")]
    InvalidSignature,

    /// An encrypted token is malformed or failed to decrypt.
    #[error("invalid message")]
    InvalidMessage,

    /// The value could not be serialized.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The authenticated payload could not be deserialized.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
}

impl MessageError {
    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            MessageError::InvalidKey(_) => "invalid_key",
            MessageError::InvalidSignature => "invalid_signature",
            MessageError::InvalidMessage => "invalid_message",
            MessageError::Serialization(_) => "serialization",
            MessageError::Deserialization(_) => "deserialization",
        }
    }

    /// Returns `true` if the error means the token itself cannot be trusted.
    pub fn is_untrusted_input(&self) -> bool {
        matches!(
            self,
            MessageError::InvalidSignature | MessageError::InvalidMessage
        )
    }
}
