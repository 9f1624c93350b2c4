//! [`KeyGenerator`]: deterministic cipher keys from a long passphrase.
//!
//! [`crate::MessageEncryptor`] refuses keys whose length does not match its
//! cipher. Callers holding a passphrase of arbitrary length run it through
//! PBKDF2-HMAC-SHA256 here first, with a salt naming the key's purpose:
//!
//! ```text
//! key = PBKDF2-HMAC-SHA256(passphrase, salt, iterations, len)
//! ```
//!
//! Every process that shares the passphrase, salt and iteration count derives
//! the same key, so tokens stay readable across processes.

use common::MessageError;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::Secret;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 1 << 16;

/// Derives fixed-length keys from a passphrase.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    passphrase: Secret,
    iterations: u32,
}

impl KeyGenerator {
    /// Create a generator with [`DEFAULT_ITERATIONS`].
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `passphrase` is empty.
    pub fn new(passphrase: impl AsRef<[u8]>) -> Result<Self, MessageError> {
        Ok(Self {
            passphrase: Secret::new(passphrase)?,
            iterations: DEFAULT_ITERATIONS,
        })
    }

    /// Override the iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `iterations` is zero.
    pub fn with_iterations(mut self, iterations: u32) -> Result<Self, MessageError> {
        if iterations == 0 {
            return Err(MessageError::InvalidKey(
                "PBKDF2 iteration count must be > 0".into(),
            ));
        }
        self.iterations = iterations;
        Ok(self)
    }

    /// Iteration count in use.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derive a `len`-byte key for `salt`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `len` is zero.
    pub fn generate_key(&self, salt: impl AsRef<[u8]>, len: usize) -> Result<Secret, MessageError> {
        if len == 0 {
            return Err(MessageError::InvalidKey("derived key length must be > 0".into()));
        }
        let mut out = Zeroizing::new(vec![0u8; len]);
        pbkdf2::pbkdf2_hmac::<Sha256>(
            self.passphrase.as_bytes(),
            salt.as_ref(),
            self.iterations,
            &mut out,
        );
        Secret::new(&*out)
    }
}
