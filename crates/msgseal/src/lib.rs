//! Tamper-evident and confidential tokens for values handed to untrusted
//! parties (cookies, URL parameters, hidden form fields).
//!
//! - [`MessageVerifier`] signs a value so that any alteration is detected.
//!   The payload stays readable.
//! - [`MessageEncryptor`] encrypts and authenticates a value so that it is
//!   both unreadable and tamper-evident.
//!
//! ```no_run
//! use msgseal::{KeyGenerator, MessageEncryptor, MessageVerifier};
//!
//! # fn main() -> Result<(), msgseal::MessageError> {
//! let verifier = MessageVerifier::new("Hey, I'm a secret!")?;
//! let token = verifier.generate(&("some", "data"))?;
//! let (a, b): (String, String) = verifier.verify(&token)?;
//! # let _ = (a, b);
//!
//! let key = KeyGenerator::new("a long passphrase")?.generate_key("encrypted cookie", 32)?;
//! let encryptor = MessageEncryptor::new(key.as_bytes())?;
//! let token = encryptor.encrypt_and_sign("MyTextIsLong")?;
//! let text: String = encryptor.decrypt_and_verify(&token)?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod encryptor;
pub mod key;
pub mod serializer;
pub mod telemetry;
pub mod verifier;

pub use common::{
    encoding, protocol, DeserializationError, MessageError, SerializationError,
    UnsupportedAlgorithm,
};

pub use config::Settings;
pub use crypto::{Cipher, DigestAlgorithm, OsRandom, RandomSource};
pub use encryptor::{EncryptorOptions, MessageEncryptor};
pub use key::{KeyGenerator, Secret};
pub use serializer::{CborSerializer, Format, JsonSerializer, Serializer, YamlSerializer};
pub use telemetry::init_tracing;
pub use verifier::MessageVerifier;
