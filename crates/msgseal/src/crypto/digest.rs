//! HMAC digest algorithms used to sign tokens.
//!
//! SHA-256 is the default. SHA-1 is kept for tokens issued by older
//! deployments and should not be chosen for new ones.

use std::{fmt, str::FromStr};

use common::{MessageError, UnsupportedAlgorithm};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

/// Hash function underlying the HMAC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum DigestAlgorithm {
    /// HMAC-SHA1 (20-byte digest). Legacy only.
    Sha1,
    /// HMAC-SHA256 (32-byte digest).
    #[default]
    Sha256,
    /// HMAC-SHA384 (48-byte digest).
    Sha384,
    /// HMAC-SHA512 (64-byte digest).
    Sha512,
}

impl DigestAlgorithm {
    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length in bytes of the raw HMAC output.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Compute `HMAC(key, data)` and return the raw digest bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if the MAC rejects the key. HMAC
    /// accepts keys of any length, so this only fires on a broken backend.
    pub fn hmac(self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, MessageError> {
        match self {
            DigestAlgorithm::Sha1 => compute::<Hmac<Sha1>>(key, data),
            DigestAlgorithm::Sha256 => compute::<Hmac<Sha256>>(key, data),
            DigestAlgorithm::Sha384 => compute::<Hmac<Sha384>>(key, data),
            DigestAlgorithm::Sha512 => compute::<Hmac<Sha512>>(key, data),
        }
    }
}

fn compute<M: Mac + hmac::digest::KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, MessageError> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|_| MessageError::InvalidKey("HMAC rejected the signing key".into()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

impl TryFrom<String> for DigestAlgorithm {
    type Error = UnsupportedAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
