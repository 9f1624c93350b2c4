//! Secret key material.
//!
//! # Security invariants
//!
//! - A [`Secret`] is never empty; construction fails with
//!   [`MessageError::InvalidKey`] instead.
//! - Key bytes are zeroed on drop and never appear in `Debug` output, logs or
//!   traces.
//! - One secret serves one purpose. The encryptor derives its MAC key with
//!   [`Secret::derive_subkey`] rather than reusing the cipher key.

pub mod generator;

pub use generator::KeyGenerator;

use std::fmt;

use common::MessageError;
use zeroize::Zeroizing;

use crate::crypto::{secure_compare, DigestAlgorithm};

/// Validated, non-empty secret bytes.
#[derive(Clone)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    /// Copy `bytes` into a new secret.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `bytes` is empty.
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, MessageError> {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Err(MessageError::InvalidKey("secret must not be empty".into()));
        }
        Ok(Self(Zeroizing::new(bytes.to_vec())))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the secret in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret holds no bytes. Construction never yields one that does.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Derive a 32-byte subkey bound to `label` as `HMAC-SHA256(self, label)`.
    ///
    /// Deterministic: the same secret and label always give the same subkey.
    pub fn derive_subkey(&self, label: &[u8]) -> Result<Secret, MessageError> {
        let bytes = Zeroizing::new(DigestAlgorithm::Sha256.hmac(self.as_bytes(), label)?);
        Secret::new(&*bytes)
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        secure_compare(self.as_bytes(), other.as_bytes())
    }
}

impl Eq for Secret {}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}
