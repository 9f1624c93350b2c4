//! Error taxonomy, token encoding, and token framing shared across `msgseal` crates.
//!
//! Nothing in this crate touches key material.

pub mod encoding;
pub mod error;
pub mod protocol;

pub use encoding::EncodingError;
pub use error::{
    DeserializationError, MessageError, SerializationError, UnsupportedAlgorithm,
};
pub use protocol::FrameError;
