//! Block cipher modes used by [`crate::MessageEncryptor`].
//!
//! **AEAD modes** (`aes-256-gcm-siv`, `aes-256-gcm`, `aes-128-gcm`) return the
//! 16-byte authentication tag separately so it can travel as its own token
//! field. AES-256-GCM-SIV is the default because it degrades gracefully if an
//! IV is ever repeated.
//!
//! **`aes-256-cbc`** provides confidentiality only. The encryptor always wraps
//! it in encrypt-then-MAC; never use [`open`] on CBC output whose MAC has not
//! been checked first.

use std::{fmt, str::FromStr};

use aes_gcm::{Aes128Gcm, Aes256Gcm};
use aes_gcm_siv::{
    aead::{self, AeadInPlace, KeyInit},
    Aes256GcmSiv,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::UnsupportedAlgorithm;
use serde::Deserialize;
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Byte length of an AEAD authentication tag.
pub const TAG_LEN: usize = 16;

/// Cipher algorithm and mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Cipher {
    /// AES-256-GCM-SIV (RFC 8452), 32-byte key, 12-byte IV.
    #[default]
    Aes256GcmSiv,
    /// AES-256-GCM, 32-byte key, 12-byte IV.
    Aes256Gcm,
    /// AES-128-GCM, 16-byte key, 12-byte IV.
    Aes128Gcm,
    /// AES-256-CBC with PKCS#7 padding, 32-byte key, 16-byte IV. Not authenticated.
    Aes256Cbc,
}

impl Cipher {
    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Cipher::Aes256GcmSiv => "aes-256-gcm-siv",
            Cipher::Aes256Gcm => "aes-256-gcm",
            Cipher::Aes128Gcm => "aes-128-gcm",
            Cipher::Aes256Cbc => "aes-256-cbc",
        }
    }

    /// Required key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Cipher::Aes128Gcm => 16,
            Cipher::Aes256GcmSiv | Cipher::Aes256Gcm | Cipher::Aes256Cbc => 32,
        }
    }

    /// Required IV length in bytes.
    pub fn iv_len(self) -> usize {
        match self {
            Cipher::Aes256GcmSiv | Cipher::Aes256Gcm | Cipher::Aes128Gcm => 12,
            Cipher::Aes256Cbc => 16,
        }
    }

    /// Whether the mode authenticates its own output.
    pub fn is_aead(self) -> bool {
        !matches!(self, Cipher::Aes256Cbc)
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cipher {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-gcm-siv" => Ok(Cipher::Aes256GcmSiv),
            "aes-256-gcm" => Ok(Cipher::Aes256Gcm),
            "aes-128-gcm" => Ok(Cipher::Aes128Gcm),
            "aes-256-cbc" => Ok(Cipher::Aes256Cbc),
            _ => Err(UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Cipher {
    type Error = UnsupportedAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Output of one encryption: ciphertext, the IV it was produced under, and the
/// AEAD tag when the mode has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Raw ciphertext bytes (without the tag).
    pub ciphertext: Vec<u8>,
    /// Raw IV bytes.
    pub iv: Vec<u8>,
    /// Authentication tag; `Some` exactly when the cipher is AEAD.
    pub tag: Option<Vec<u8>>,
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key is the wrong length for the cipher.
    #[error("invalid key length for {cipher}: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Cipher the key was supplied for.
        cipher: Cipher,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// The IV is the wrong length for the cipher.
    #[error("invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIvLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// The tag is missing or the wrong length.
    #[error("invalid authentication tag")]
    InvalidTag,

    /// AEAD encryption failed, or decryption failed authentication.
    #[error("aead operation failed")]
    AeadFailure,

    /// CBC decryption produced invalid padding or a misaligned ciphertext.
    #[error("block decryption failed")]
    DecryptFailure,
}

/// Encrypt `plaintext` under `key` and `iv`.
///
/// The caller owns IV generation and must never reuse an IV with the same key.
/// AEAD modes authenticate `aad` alongside the ciphertext; CBC ignores it, so
/// callers bind context into their own MAC instead.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] or [`CipherError::InvalidIvLength`]
/// if the inputs do not fit the cipher, and [`CipherError::AeadFailure`] on an
/// internal AEAD error (unreachable with valid lengths).
pub fn seal(
    cipher: Cipher,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Sealed, CipherError> {
    check_lengths(cipher, key, iv)?;
    match cipher {
        Cipher::Aes256GcmSiv => seal_aead::<Aes256GcmSiv>(cipher, key, iv, plaintext, aad),
        Cipher::Aes256Gcm => seal_aead::<Aes256Gcm>(cipher, key, iv, plaintext, aad),
        Cipher::Aes128Gcm => seal_aead::<Aes128Gcm>(cipher, key, iv, plaintext, aad),
        Cipher::Aes256Cbc => {
            let ciphertext = Aes256CbcEnc::new_from_slices(key, iv)
                .map_err(|_| invalid_key(cipher, key))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
            Ok(Sealed {
                ciphertext,
                iv: iv.to_vec(),
                tag: None,
            })
        }
    }
}

/// Decrypt a [`Sealed`] value back to plaintext bytes. `aad` must match what
/// was passed to [`seal`].
///
/// # Errors
///
/// Returns a length error for a wrong key or IV, [`CipherError::InvalidTag`] if
/// an AEAD tag is missing or malformed, [`CipherError::AeadFailure`] if
/// authentication fails, and [`CipherError::DecryptFailure`] for bad CBC
/// padding or length.
pub fn open(
    cipher: Cipher,
    key: &[u8],
    sealed: &Sealed,
    aad: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_lengths(cipher, key, &sealed.iv)?;
    match cipher {
        Cipher::Aes256GcmSiv => open_aead::<Aes256GcmSiv>(cipher, key, sealed, aad),
        Cipher::Aes256Gcm => open_aead::<Aes256Gcm>(cipher, key, sealed, aad),
        Cipher::Aes128Gcm => open_aead::<Aes128Gcm>(cipher, key, sealed, aad),
        Cipher::Aes256Cbc => Aes256CbcDec::new_from_slices(key, &sealed.iv)
            .map_err(|_| invalid_key(cipher, key))?
            .decrypt_padded_vec_mut::<Pkcs7>(&sealed.ciphertext)
            .map_err(|_| CipherError::DecryptFailure),
    }
}

fn seal_aead<A: AeadInPlace + KeyInit>(
    cipher: Cipher,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Sealed, CipherError> {
    let aead = A::new_from_slice(key).map_err(|_| invalid_key(cipher, key))?;
    let nonce = aead::Nonce::<A>::from_slice(iv);
    let mut buffer = plaintext.to_vec();
    let tag = aead
        .encrypt_in_place_detached(nonce, aad, &mut buffer)
        .map_err(|_| CipherError::AeadFailure)?;
    Ok(Sealed {
        ciphertext: buffer,
        iv: iv.to_vec(),
        tag: Some(tag.to_vec()),
    })
}

fn open_aead<A: AeadInPlace + KeyInit>(
    cipher: Cipher,
    key: &[u8],
    sealed: &Sealed,
    aad: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let tag = match sealed.tag.as_deref() {
        Some(tag) if tag.len() == TAG_LEN => aead::Tag::<A>::clone_from_slice(tag),
        _ => return Err(CipherError::InvalidTag),
    };
    let aead = A::new_from_slice(key).map_err(|_| invalid_key(cipher, key))?;
    let nonce = aead::Nonce::<A>::from_slice(&sealed.iv);
    let mut buffer = sealed.ciphertext.clone();
    aead.decrypt_in_place_detached(nonce, aad, &mut buffer, &tag)
        .map_err(|_| CipherError::AeadFailure)?;
    Ok(buffer)
}

fn check_lengths(cipher: Cipher, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
    if key.len() != cipher.key_len() {
        return Err(invalid_key(cipher, key));
    }
    if iv.len() != cipher.iv_len() {
        return Err(CipherError::InvalidIvLength {
            expected: cipher.iv_len(),
            actual: iv.len(),
        });
    }
    Ok(())
}

fn invalid_key(cipher: Cipher, key: &[u8]) -> CipherError {
    CipherError::InvalidKeyLength {
        cipher,
        expected: cipher.key_len(),
        actual: key.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::{OsRandom, RandomSource};

    const ALL: [Cipher; 4] = [
        Cipher::Aes256GcmSiv,
        Cipher::Aes256Gcm,
        Cipher::Aes128Gcm,
        Cipher::Aes256Cbc,
    ];

    const AAD: &[u8] = b"json";

    fn random_bytes(len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        OsRandom.fill_bytes(&mut buf);
        buf
    }

    fn seal_random(cipher: Cipher, key: &[u8], plaintext: &[u8]) -> Sealed {
        seal(cipher, key, &random_bytes(cipher.iv_len()), plaintext, AAD).unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        for cipher in ALL {
            let key = random_bytes(cipher.key_len());
            let sealed = seal_random(cipher, &key, b"123-45-6789");
            assert_eq!(open(cipher, &key, &sealed, AAD).unwrap(), b"123-45-6789", "{cipher}");
        }
    }

    #[test]
    fn tag_present_only_for_aead() {
        for cipher in ALL {
            let key = random_bytes(cipher.key_len());
            let sealed = seal_random(cipher, &key, b"x");
            assert_eq!(sealed.tag.is_some(), cipher.is_aead(), "{cipher}");
            if let Some(tag) = sealed.tag {
                assert_eq!(tag.len(), TAG_LEN);
            }
        }
    }

    #[test]
    fn aead_ciphertext_excludes_tag() {
        let key = random_bytes(32);
        let sealed = seal_random(Cipher::Aes256GcmSiv, &key, b"MyTextIsLong");
        assert_eq!(sealed.ciphertext.len(), b"MyTextIsLong".len());
    }

    #[test]
    fn mismatched_aad_fails_auth() {
        for cipher in ALL.into_iter().filter(|c| c.is_aead()) {
            let key = random_bytes(cipher.key_len());
            let sealed = seal_random(cipher, &key, b"{\"admin\":true}");
            for aad in [&b"yaml"[..], &b""[..]] {
                let result = open(cipher, &key, &sealed, aad);
                assert_eq!(result, Err(CipherError::AeadFailure), "{cipher}");
            }
        }
    }

    #[test]
    fn wrong_key_fails_decryption() {
        for cipher in ALL.into_iter().filter(|c| c.is_aead()) {
            let key = random_bytes(cipher.key_len());
            let mut other = key.clone();
            other[0] ^= 0x01;
            let sealed = seal_random(cipher, &key, b"secret");
            assert_eq!(open(cipher, &other, &sealed, AAD), Err(CipherError::AeadFailure), "{cipher}");
        }
    }

    #[test]
    fn invalid_key_length_rejected() {
        let err = seal(Cipher::Aes256GcmSiv, &[0u8; 16], &[0u8; 12], b"x", AAD).unwrap_err();
        assert_eq!(
            err,
            CipherError::InvalidKeyLength {
                cipher: Cipher::Aes256GcmSiv,
                expected: 32,
                actual: 16
            }
        );
        assert!(seal(Cipher::Aes128Gcm, &[0u8; 32], &[0u8; 12], b"x", AAD).is_err());
    }

    #[test]
    fn invalid_iv_length_rejected() {
        let key = random_bytes(32);
        assert!(matches!(
            seal(Cipher::Aes256Gcm, &key, &[0u8; 16], b"x", AAD),
            Err(CipherError::InvalidIvLength { expected: 12, actual: 16 })
        ));
        let mut sealed = seal_random(Cipher::Aes256Cbc, &key, b"x");
        sealed.iv.pop();
        assert!(matches!(
            open(Cipher::Aes256Cbc, &key, &sealed, AAD),
            Err(CipherError::InvalidIvLength { .. })
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        for cipher in ALL.into_iter().filter(|c| c.is_aead()) {
            let key = random_bytes(cipher.key_len());
            let mut sealed = seal_random(cipher, &key, b"tamper me");
            sealed.ciphertext[0] ^= 0xFF;
            assert!(open(cipher, &key, &sealed, AAD).is_err(), "{cipher}");
        }
    }

    #[test]
    fn tampered_tag_fails_auth() {
        let key = random_bytes(32);
        let mut sealed = seal_random(Cipher::Aes256Gcm, &key, b"tamper me");
        if let Some(tag) = sealed.tag.as_mut() {
            tag[TAG_LEN - 1] ^= 0x01;
        }
        assert_eq!(open(Cipher::Aes256Gcm, &key, &sealed, AAD), Err(CipherError::AeadFailure));
    }

    #[test]
    fn missing_or_short_tag_rejected() {
        let key = random_bytes(32);
        let mut sealed = seal_random(Cipher::Aes256GcmSiv, &key, b"x");
        if let Some(tag) = sealed.tag.as_mut() {
            tag.pop();
        }
        assert_eq!(open(Cipher::Aes256GcmSiv, &key, &sealed, AAD), Err(CipherError::InvalidTag));
        sealed.tag = None;
        assert_eq!(open(Cipher::Aes256GcmSiv, &key, &sealed, AAD), Err(CipherError::InvalidTag));
    }

    #[test]
    fn cbc_rejects_misaligned_ciphertext() {
        let key = random_bytes(32);
        let mut sealed = seal_random(Cipher::Aes256Cbc, &key, b"MyTextIsLong");
        assert_eq!(sealed.ciphertext.len(), 16);
        sealed.ciphertext.pop();
        assert_eq!(open(Cipher::Aes256Cbc, &key, &sealed, AAD), Err(CipherError::DecryptFailure));
    }

    #[test]
    fn parse_names() {
        for cipher in ALL {
            assert_eq!(cipher.name().parse::<Cipher>().unwrap(), cipher);
        }
        assert_eq!("AES-256-GCM".parse::<Cipher>().unwrap(), Cipher::Aes256Gcm);
        assert!("aes-256-ecb".parse::<Cipher>().is_err());
    }

    #[test]
    fn default_is_gcm_siv() {
        assert_eq!(Cipher::default(), Cipher::Aes256GcmSiv);
        assert!(Cipher::default().is_aead());
    }
}
