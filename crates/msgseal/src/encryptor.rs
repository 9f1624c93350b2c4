//! [`MessageEncryptor`]: encrypted, authenticated tokens.
//!
//! # Token format
//!
//! ```text
//! AEAD:  <encode(ciphertext)>--<encode(iv)>--<encode(auth_tag)>
//! CBC:   <encode(ciphertext)>--<encode(iv)>--<encode(HMAC(sign_key, "<id>--<ciphertext>--<iv>"))>
//! ```
//!
//! `<id>` is the serializer's [`Serializer::id`]. AEAD modes authenticate it
//! as associated data; CBC mixes it into the MAC input. It never travels in
//! the token, so a token sealed under one format fails authentication under
//! any other.
//!
//! A fresh IV is drawn from the [`RandomSource`] on every call. Non-AEAD
//! ciphers are always encrypt-then-MAC: the MAC covers the encoded
//! ciphertext and IV exactly as they appear in the token and is checked
//! before anything is decrypted.
//!
//! # Keys
//!
//! The cipher key must already have the cipher's exact length; anything else
//! is rejected at construction. Derive keys from a passphrase with
//! [`crate::KeyGenerator`]. For CBC, the MAC key is the `sign_secret` option
//! or, if none is given, `HMAC-SHA256(cipher_key, SIGNING_KEY_LABEL)`.

use common::{encoding, protocol, MessageError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::crypto::{
    cipher, secure_compare, Cipher, CipherError, DigestAlgorithm, OsRandom, RandomSource, Sealed,
};
use crate::key::Secret;
use crate::serializer::{JsonSerializer, Serializer};

/// Label used to derive the CBC signing key from the cipher key.
pub const SIGNING_KEY_LABEL: &[u8] = b"msgseal.encryptor.signing-key";

/// Construction options for [`MessageEncryptor`].
#[derive(Debug, Clone, Default)]
pub struct EncryptorOptions {
    /// Cipher and mode. Defaults to [`Cipher::Aes256GcmSiv`].
    pub cipher: Cipher,
    /// HMAC digest for non-AEAD ciphers. Ignored for AEAD ciphers.
    pub digest: DigestAlgorithm,
    /// Separate MAC key for non-AEAD ciphers. Ignored for AEAD ciphers.
    pub sign_secret: Option<Secret>,
}

/// How the third token field is produced and checked.
#[derive(Debug, Clone)]
enum Integrity {
    Aead,
    Mac { key: Secret, digest: DigestAlgorithm },
}

/// Encrypts values into tokens and decrypts verified tokens back into values.
///
/// Immutable after construction; share it freely across threads.
#[derive(Debug, Clone)]
pub struct MessageEncryptor<S = JsonSerializer, R = OsRandom> {
    cipher: Cipher,
    key: Secret,
    integrity: Integrity,
    serializer: S,
    rng: R,
}

impl MessageEncryptor {
    /// Create an encryptor using JSON and AES-256-GCM-SIV.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] unless `secret` is exactly 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, MessageError> {
        Self::with_options(secret, JsonSerializer, EncryptorOptions::default())
    }
}

impl<S: Serializer> MessageEncryptor<S> {
    /// Create an encryptor with explicit serializer and options.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `secret` is empty or not
    /// [`Cipher::key_len`] bytes.
    pub fn with_options(
        secret: impl AsRef<[u8]>,
        serializer: S,
        options: EncryptorOptions,
    ) -> Result<Self, MessageError> {
        let key = Secret::new(secret)?;
        let cipher = options.cipher;
        if key.len() != cipher.key_len() {
            return Err(MessageError::InvalidKey(format!(
                "{cipher} requires a {}-byte key, got {} bytes",
                cipher.key_len(),
                key.len()
            )));
        }

        let integrity = if cipher.is_aead() {
            Integrity::Aead
        } else {
            let mac_key = match options.sign_secret {
                Some(sign_secret) => sign_secret,
                None => key.derive_subkey(SIGNING_KEY_LABEL)?,
            };
            Integrity::Mac {
                key: mac_key,
                digest: options.digest,
            }
        };

        Ok(Self {
            cipher,
            key,
            integrity,
            serializer,
            rng: OsRandom,
        })
    }
}

impl<S: Serializer, R: RandomSource> MessageEncryptor<S, R> {
    /// Replace the IV source. It must be a CSPRNG.
    pub fn with_random_source<R2: RandomSource>(self, rng: R2) -> MessageEncryptor<S, R2> {
        MessageEncryptor {
            cipher: self.cipher,
            key: self.key,
            integrity: self.integrity,
            serializer: self.serializer,
            rng,
        }
    }

    /// Cipher in use.
    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    /// Serialize, encrypt and authenticate `value`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Serialization`] if the serializer rejects `value`.
    pub fn encrypt_and_sign<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, MessageError> {
        let plaintext = self.serializer.dump(value)?;

        let mut iv = vec![0u8; self.cipher.iv_len()];
        self.rng.fill_bytes(&mut iv);

        let aad = self.serializer.id().as_bytes();
        let sealed = cipher::seal(self.cipher, self.key.as_bytes(), &iv, &plaintext, aad)
            .map_err(seal_failure)?;

        let ciphertext = encoding::encode(&sealed.ciphertext);
        let iv = encoding::encode(&sealed.iv);
        let trailer = match &self.integrity {
            Integrity::Aead => {
                encoding::encode(sealed.tag.ok_or_else(|| seal_failure(CipherError::InvalidTag))?)
            }
            Integrity::Mac { key, digest } => {
                encoding::encode(self.mac(key, *digest, &ciphertext, &iv)?)
            }
        };
        Ok(protocol::join_fields(&[&ciphertext, &iv, &trailer]))
    }

    /// Authenticate and decrypt `token`, returning the value it carries.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidSignature`] if a CBC token's MAC does not
    /// match, [`MessageError::InvalidMessage`] for any other malformed,
    /// tampered or undecryptable token, and [`MessageError::Deserialization`]
    /// if the decrypted payload cannot be read as `T`.
    pub fn decrypt_and_verify<T: DeserializeOwned>(
        &self,
        token: impl AsRef<[u8]>,
    ) -> Result<T, MessageError> {
        let plaintext = self.open(token.as_ref())?;
        Ok(self.serializer.load(&plaintext)?)
    }

    fn open(&self, token: &[u8]) -> Result<Vec<u8>, MessageError> {
        let [ciphertext, iv, trailer] = protocol::split_fields::<3>(token).map_err(|e| {
            debug!(error = %e, "rejecting malformed encrypted token");
            MessageError::InvalidMessage
        })?;

        let tag = match &self.integrity {
            Integrity::Aead => Some(decode_field(trailer, "auth tag")?),
            Integrity::Mac { key, digest } => {
                let supplied = encoding::decode(trailer).map_err(|e| {
                    debug!(error = %e, "rejecting encrypted token: MAC encoding");
                    MessageError::InvalidSignature
                })?;
                let expected = self.mac(key, *digest, ciphertext, iv)?;
                if !secure_compare(&expected, &supplied) {
                    debug!(
                        digest = %digest,
                        serializer = self.serializer.id(),
                        "rejecting encrypted token: MAC mismatch"
                    );
                    return Err(MessageError::InvalidSignature);
                }
                None
            }
        };

        let sealed = Sealed {
            ciphertext: decode_field(ciphertext, "ciphertext")?,
            iv: decode_field(iv, "iv")?,
            tag,
        };
        cipher::open(self.cipher, self.key.as_bytes(), &sealed, self.serializer.id().as_bytes())
            .map_err(open_failure)
    }

    /// HMAC over `"<id>--<ciphertext>--<iv>"`, the encoded fields as they
    /// appear in the token.
    fn mac(
        &self,
        key: &Secret,
        digest: DigestAlgorithm,
        ciphertext: &str,
        iv: &str,
    ) -> Result<Vec<u8>, MessageError> {
        let signed = protocol::join_fields(&[self.serializer.id(), ciphertext, iv]);
        digest.hmac(key.as_bytes(), signed.as_bytes())
    }
}

fn decode_field(text: &str, field: &'static str) -> Result<Vec<u8>, MessageError> {
    encoding::decode(text).map_err(|e| {
        debug!(field, error = %e, "rejecting encrypted token: field encoding");
        MessageError::InvalidMessage
    })
}

/// Sealing takes no untrusted input; its failures are configuration errors.
fn seal_failure(err: CipherError) -> MessageError {
    debug!(error = %err, "cipher failed to seal");
    MessageError::InvalidKey(err.to_string())
}

fn open_failure(err: CipherError) -> MessageError {
    debug!(error = %err, "cipher rejected token");
    match err {
        CipherError::InvalidKeyLength { .. } => MessageError::InvalidKey(err.to_string()),
        _ => MessageError::InvalidMessage,
    }
}
