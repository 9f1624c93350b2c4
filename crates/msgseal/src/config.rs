//! Configuration loading and validation.
//!
//! Algorithm choices are plain values threaded into constructors; nothing in
//! the crate reads global state. [`Settings::from_env`] reads variables
//! prefixed `MSGSEAL_`:
//!
//! | Variable                  | Default           |
//! |---------------------------|-------------------|
//! | `MSGSEAL_DIGEST`          | `sha256`          |
//! | `MSGSEAL_CIPHER`          | `aes-256-gcm-siv` |
//! | `MSGSEAL_SERIALIZER`      | `json`            |
//! | `MSGSEAL_KDF_ITERATIONS`  | `65536`           |
//! | `MSGSEAL_LOG_LEVEL`       | `info`            |
//!
//! Secrets are never read from configuration; callers pass them in.

use anyhow::{Context, Result};
use common::MessageError;
use serde::Deserialize;

use crate::crypto::{Cipher, DigestAlgorithm};
use crate::encryptor::{EncryptorOptions, MessageEncryptor};
use crate::key::{generator::DEFAULT_ITERATIONS, KeyGenerator, Secret};
use crate::serializer::Format;
use crate::verifier::MessageVerifier;

/// Environment variable prefix read by [`Settings::from_env`].
pub const ENV_PREFIX: &str = "MSGSEAL";

/// Validated algorithm and logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// HMAC digest for signed tokens and CBC MACs.
    #[serde(default)]
    pub digest: DigestAlgorithm,

    /// Cipher for encrypted tokens.
    #[serde(default)]
    pub cipher: Cipher,

    /// Serialization format for token payloads.
    #[serde(default)]
    pub serializer: Format,

    /// PBKDF2 iteration count for [`KeyGenerator`].
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_ITERATIONS
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            digest: DigestAlgorithm::default(),
            cipher: Cipher::default(),
            serializer: Format::default(),
            kdf_iterations: default_kdf_iterations(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load and validate settings from `MSGSEAL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("failed to build configuration from environment")?;
        Self::from_config(cfg)
    }

    /// Deserialize and validate settings from an already-built configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed or fails validation.
    pub fn from_config(cfg: config::Config) -> Result<Self> {
        let settings: Settings = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.kdf_iterations == 0 {
            anyhow::bail!("{ENV_PREFIX}_KDF_ITERATIONS must be > 0");
        }
        ensure_non_empty(&self.log_level, "LOG_LEVEL")?;
        Ok(())
    }

    /// Build a [`MessageVerifier`] with these settings.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `secret` is empty.
    pub fn verifier(&self, secret: impl AsRef<[u8]>) -> Result<MessageVerifier<Format>, MessageError> {
        Ok(MessageVerifier::with_serializer(secret, self.serializer)?.with_digest(self.digest))
    }

    /// Build a [`MessageEncryptor`] with these settings.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `secret` is empty or the wrong
    /// length for the configured cipher.
    pub fn encryptor(
        &self,
        secret: impl AsRef<[u8]>,
        sign_secret: Option<Secret>,
    ) -> Result<MessageEncryptor<Format>, MessageError> {
        let options = EncryptorOptions {
            cipher: self.cipher,
            digest: self.digest,
            sign_secret,
        };
        MessageEncryptor::with_options(secret, self.serializer, options)
    }

    /// Build a [`KeyGenerator`] with the configured iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `passphrase` is empty.
    pub fn key_generator(&self, passphrase: impl AsRef<[u8]>) -> Result<KeyGenerator, MessageError> {
        KeyGenerator::new(passphrase)?.with_iterations(self.kdf_iterations)
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{ENV_PREFIX}_{name} must not be empty");
    }
    Ok(())
}
