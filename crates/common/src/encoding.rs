//! Reversible mapping between raw bytes and URL-safe token fields.
//!
//! # Alphabet
//!
//! ```text
//! A-Z a-z 0-9 . _      (padding: =)
//! ```
//!
//! This is the RFC 4648 URL-safe alphabet with `.` in place of `-`. Token
//! fields are joined with `--`, so no encoded field may ever contain `-`.
//! Every token field in the crate goes through this engine; callers cannot
//! pick another alphabet.

use base64::{
    alphabet::Alphabet,
    engine::{general_purpose, GeneralPurpose},
    Engine as _,
};
use thiserror::Error;

/// Alphabet used for every token field.
pub const TOKEN_ALPHABET: Alphabet =
    match Alphabet::new("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789._") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("token alphabet must contain 64 unique printable characters"),
    };

/// Padded engine over [`TOKEN_ALPHABET`]. Decoding requires canonical padding
/// and rejects non-zero trailing bits.
pub const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(&TOKEN_ALPHABET, general_purpose::PAD);

/// Errors produced when decoding a token field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Invalid alphabet character, invalid padding, or invalid length.
    #[error("malformed token field: {0}")]
    Malformed(#[from] base64::DecodeError),

    /// The decoded bytes do not re-encode to the input.
    #[error("token field does not round-trip")]
    NotCanonical,
}

/// Encode raw bytes as a token field.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    TOKEN_ENGINE.encode(bytes)
}

/// Decode a token field back to raw bytes.
///
/// # Errors
///
/// Returns [`EncodingError::Malformed`] for characters outside the alphabet or
/// bad padding, and [`EncodingError::NotCanonical`] if the result would not
/// re-encode to `text`.
pub fn decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    let bytes = TOKEN_ENGINE.decode(text)?;
    if TOKEN_ENGINE.encode(&bytes) != text {
        return Err(EncodingError::NotCanonical);
    }
    Ok(bytes)
}
