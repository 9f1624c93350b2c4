//! Token framing: fixed-arity fields joined by `--`.
//!
//! ```text
//! signed:     <payload>--<hex_digest>
//! encrypted:  <ciphertext>--<iv>--<auth_tag | mac>
//! ```
//!
//! Fields are produced by [`crate::encoding`] (or are lowercase hex), neither
//! of which can emit `-`, so splitting on every `--` recovers the fields
//! exactly.

use thiserror::Error;

/// Literal separator placed between token fields.
pub const SEPARATOR: &str = "--";

/// Errors produced while splitting a token into its fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The token is empty.
    #[error("token is empty")]
    Empty,

    /// The token bytes are not valid UTF-8.
    #[error("token is not valid UTF-8")]
    NotUtf8,

    /// The token has the wrong number of fields.
    #[error("expected {expected} token fields, found {found}")]
    FieldCount {
        /// Number of fields required by the operation.
        expected: usize,
        /// Number of fields present.
        found: usize,
    },

    /// A field between two separators is empty.
    #[error("token field {0} is empty")]
    EmptyField(usize),
}

/// Join already-encoded fields into a token.
pub fn join_fields(fields: &[&str]) -> String {
    fields.join(SEPARATOR)
}

/// Split `token` into exactly `N` non-empty fields.
///
/// # Errors
///
/// Returns a [`FrameError`] describing the first structural problem found.
pub fn split_fields<const N: usize>(token: &[u8]) -> Result<[&str; N], FrameError> {
    if token.is_empty() {
        return Err(FrameError::Empty);
    }
    let text = std::str::from_utf8(token).map_err(|_| FrameError::NotUtf8)?;

    let mut fields = [""; N];
    let mut found = 0;
    for part in text.split(SEPARATOR) {
        if let Some(slot) = fields.get_mut(found) {
            *slot = part;
        }
        found += 1;
    }
    if found != N {
        return Err(FrameError::FieldCount { expected: N, found });
    }
    if let Some(index) = fields.iter().position(|f| f.is_empty()) {
        return Err(FrameError::EmptyField(index));
    }
    Ok(fields)
}
