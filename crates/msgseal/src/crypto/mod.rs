//! Cryptographic primitives: HMAC digests, cipher modes, constant-time
//! comparison, and the IV random source.
//!
//! This module knows nothing about tokens or serializers. The verifier and
//! encryptor compose these primitives into the wire format.

pub mod cipher;
pub mod compare;
pub mod digest;
pub mod random;

pub use cipher::{Cipher, CipherError, Sealed};
pub use compare::secure_compare;
pub use digest::DigestAlgorithm;
pub use random::{OsRandom, RandomSource};
