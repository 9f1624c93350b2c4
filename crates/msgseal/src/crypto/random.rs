//! Source of IV bytes for the encryptor.

use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};

/// Cryptographically secure random byte source.
///
/// Implementations must be safe to call from many threads at once.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}
