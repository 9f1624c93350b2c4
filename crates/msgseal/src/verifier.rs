//! [`MessageVerifier`]: signed, tamper-evident tokens.
//!
//! # Token format
//!
//! ```text
//! <encode(dump(value))>--<hex(HMAC(secret, "<serializer id>--<encode(dump(value))>"))>
//! ```
//!
//! The serializer's [`Serializer::id`] is part of the signed input and never
//! travels in the token, so a token signed under one format fails
//! authentication under any other, even where one format can parse the
//! other's bytes.
//!
//! The payload is readable by anyone holding the token; the signature only
//! guarantees that it has not been altered. Use [`crate::MessageEncryptor`]
//! when the content must stay confidential.
//!
//! Authenticity is checked before anything is decoded or deserialized.
//! Authenticity failures surface as [`MessageError::InvalidSignature`];
//! failures to read an authentic payload surface as
//! [`MessageError::Deserialization`].

use common::{encoding, protocol, MessageError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::crypto::{secure_compare, DigestAlgorithm};
use crate::key::Secret;
use crate::serializer::{JsonSerializer, Serializer};

/// Signs values into tokens and verifies tokens back into values.
///
/// Immutable after construction; share it freely across threads.
#[derive(Debug, Clone)]
pub struct MessageVerifier<S = JsonSerializer> {
    secret: Secret,
    digest: DigestAlgorithm,
    serializer: S,
}

impl MessageVerifier {
    /// Create a verifier using JSON and HMAC-SHA256.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `secret` is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, MessageError> {
        Self::with_serializer(secret, JsonSerializer)
    }
}

impl<S: Serializer> MessageVerifier<S> {
    /// Create a verifier with a custom serializer and HMAC-SHA256.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKey`] if `secret` is empty.
    pub fn with_serializer(secret: impl AsRef<[u8]>, serializer: S) -> Result<Self, MessageError> {
        Ok(Self {
            secret: Secret::new(secret)?,
            digest: DigestAlgorithm::default(),
            serializer,
        })
    }

    /// Replace the digest algorithm.
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// Digest algorithm in use.
    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    /// Serialize and sign `value`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Serialization`] if the serializer rejects `value`.
    pub fn generate<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, MessageError> {
        let payload = encoding::encode(self.serializer.dump(value)?);
        let digest = self.generate_digest(&payload)?;
        Ok(protocol::join_fields(&[&payload, &digest]))
    }

    /// Check `token` and return the value it carries.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidSignature`] if the token is empty,
    /// malformed, or its digest does not match, and
    /// [`MessageError::Deserialization`] if the authentic payload cannot be
    /// read as `T`.
    pub fn verify<T: DeserializeOwned>(&self, token: impl AsRef<[u8]>) -> Result<T, MessageError> {
        let payload = self.authenticate(token.as_ref())?;
        Ok(self.serializer.load(&payload)?)
    }

    /// Like [`MessageVerifier::verify`], but an authenticity failure yields
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Deserialization`] if the token is authentic but
    /// its payload cannot be read as `T`.
    pub fn verified<T: DeserializeOwned>(
        &self,
        token: impl AsRef<[u8]>,
    ) -> Result<Option<T>, MessageError> {
        match self.authenticate(token.as_ref()) {
            Ok(payload) => Ok(Some(self.serializer.load(&payload)?)),
            Err(_) => Ok(None),
        }
    }

    /// Returns `true` if `token` is authentic. Never deserializes.
    pub fn is_valid_message(&self, token: impl AsRef<[u8]>) -> bool {
        self.authenticate(token.as_ref()).is_ok()
    }

    /// Split, check the digest, then decode the payload field.
    fn authenticate(&self, token: &[u8]) -> Result<Vec<u8>, MessageError> {
        let [payload, digest] = protocol::split_fields::<2>(token).map_err(|e| {
            debug!(error = %e, "rejecting malformed signed token");
            MessageError::InvalidSignature
        })?;

        let expected = self.generate_digest(payload)?;
        if !secure_compare(expected.as_bytes(), digest.as_bytes()) {
            debug!(
                digest = %self.digest,
                serializer = self.serializer.id(),
                "rejecting signed token: digest mismatch"
            );
            return Err(MessageError::InvalidSignature);
        }

        encoding::decode(payload).map_err(|e| {
            debug!(error = %e, "rejecting signed token: payload encoding");
            MessageError::InvalidSignature
        })
    }

    fn generate_digest(&self, data: &str) -> Result<String, MessageError> {
        let signed = protocol::join_fields(&[self.serializer.id(), data]);
        let mac = self.digest.hmac(self.secret.as_bytes(), signed.as_bytes())?;
        Ok(hex::encode(mac))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::{CborSerializer, YamlSerializer};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    const SECRET: &str = "Hey, I'm a secret!";

    fn verifier() -> MessageVerifier {
        MessageVerifier::new(SECRET).unwrap()
    }

    fn data() -> Value {
        json!({"some": "data", "now": "2010-01-01T00:00:00.000Z"})
    }

    fn assert_not_verified(verifier: &MessageVerifier, token: impl AsRef<[u8]>) {
        let result = verifier.verify::<Value>(token.as_ref());
        assert!(
            matches!(result, Err(MessageError::InvalidSignature)),
            "expected invalid signature for {:?}, got {result:?}",
            String::from_utf8_lossy(token.as_ref()),
        );
        assert!(!verifier.is_valid_message(token));
    }

    #[test]
    fn simple_round_trip() {
        let verifier = verifier();
        let token = verifier.generate(&data()).unwrap();
        assert_eq!(verifier.verify::<Value>(&token).unwrap(), data());
        assert!(verifier.is_valid_message(&token));
    }

    #[test]
    fn struct_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Session {
            user_id: u64,
            roles: Vec<String>,
        }
        let session = Session {
            user_id: 7,
            roles: vec!["admin".into()],
        };
        let verifier = verifier();
        let token = verifier.generate(&session).unwrap();
        assert_eq!(verifier.verify::<Session>(token).unwrap(), session);
    }

    #[test]
    fn token_shape() {
        let token = verifier().generate(&json!({"some": "data"})).unwrap();
        let (payload, digest) = token.split_once("--").unwrap();
        assert_eq!(encoding::decode(payload).unwrap(), br#"{"some":"data"}"#);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(token.matches("--").count(), 1);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = verifier().generate(&data()).unwrap();
        let b = verifier().generate(&data()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_signature_raises() {
        let verifier = verifier();
        assert_not_verified(&verifier, "");
        assert_not_verified(&verifier, b"");
    }

    #[test]
    fn tampered_data_raises() {
        let verifier = verifier();
        let token = verifier.generate(&data()).unwrap();
        let (payload, digest) = token.split_once("--").unwrap();
        let reversed_payload: String = payload.chars().rev().collect();
        let reversed_digest: String = digest.chars().rev().collect();

        assert_not_verified(&verifier, format!("{reversed_payload}--{digest}"));
        assert_not_verified(&verifier, format!("{payload}--{reversed_digest}"));
        assert_not_verified(&verifier, "purejunk");
        assert_not_verified(&verifier, b"\xff");
    }

    #[test]
    fn altered_last_character_raises() {
        let verifier = verifier();
        let token = verifier.generate(&json!({"some": "data"})).unwrap();
        assert_eq!(verifier.verify::<Value>(&token).unwrap(), json!({"some": "data"}));
        let altered = format!("{}x", &token[..token.len() - 1]);
        assert_not_verified(&verifier, altered);
    }

    #[test]
    fn every_single_byte_flip_raises() {
        let verifier = verifier();
        let token = verifier.generate(&data()).unwrap().into_bytes();
        for i in 0..token.len() {
            let mut tampered = token.clone();
            tampered[i] ^= 0x01;
            assert_not_verified(&verifier, &tampered);
        }
    }

    #[test]
    fn digest_from_another_payload_raises() {
        let verifier = verifier();
        let first = verifier.generate(&json!({"user": 1})).unwrap();
        let second = verifier.generate(&json!({"user": 2})).unwrap();
        let (payload, _) = first.split_once("--").unwrap();
        let (_, other_digest) = second.split_once("--").unwrap();
        assert_not_verified(&verifier, format!("{payload}--{other_digest}"));
    }

    #[test]
    fn truncated_token_raises() {
        let verifier = verifier();
        let token = verifier.generate(&data()).unwrap();
        for cut in [1, 2, 10, token.len() / 2, token.len() - 1] {
            assert_not_verified(&verifier, &token[..cut]);
        }
    }

    #[test]
    fn extra_fields_raise() {
        let verifier = verifier();
        let token = verifier.generate(&data()).unwrap();
        assert_not_verified(&verifier, format!("{token}--{token}"));
        assert_not_verified(&verifier, format!("--{token}"));
        assert_not_verified(&verifier, format!("{token}--"));
    }

    #[test]
    fn payload_outside_alphabet_raises_even_with_matching_digest() {
        let verifier = verifier();
        let payload = "e30+";
        let digest = verifier.generate_digest(payload).unwrap();
        assert_not_verified(&verifier, format!("{payload}--{digest}"));
    }

    #[test]
    fn different_secret_raises() {
        let token = verifier().generate(&data()).unwrap();
        let other = MessageVerifier::new("Hey, I'm another secret!").unwrap();
        assert_not_verified(&other, token);
    }

    #[test]
    fn different_digest_raises() {
        let sha1 = verifier().with_digest(DigestAlgorithm::Sha1);
        let token = sha1.generate(&data()).unwrap();
        let (_, digest) = token.split_once("--").unwrap();
        assert_eq!(digest.len(), 40);
        assert_eq!(sha1.verify::<Value>(&token).unwrap(), data());
        assert_not_verified(&verifier(), token);
    }

    #[test]
    fn sha512_round_trip() {
        let verifier = verifier().with_digest(DigestAlgorithm::Sha512);
        assert_eq!(verifier.digest(), DigestAlgorithm::Sha512);
        let token = verifier.generate("MyTextIsLong").unwrap();
        assert_eq!(verifier.verify::<String>(token).unwrap(), "MyTextIsLong");
    }

    #[test]
    fn empty_secret_is_invalid_key() {
        assert!(matches!(MessageVerifier::new(""), Err(MessageError::InvalidKey(_))));
        assert!(matches!(
            MessageVerifier::with_serializer(Vec::<u8>::new(), CborSerializer),
            Err(MessageError::InvalidKey(_))
        ));
    }

    #[test]
    fn unreadable_payload_is_deserialization_error() {
        #[derive(Serialize)]
        struct AutoloadClass {
            foo: String,
        }
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Expected {
            bar: u32,
        }

        let verifier = verifier();
        let token = verifier
            .generate(&json!({"foo": AutoloadClass { foo: "foo".into() }}))
            .unwrap();
        assert!(verifier.is_valid_message(&token));

        let err = verifier.verify::<Expected>(&token).unwrap_err();
        assert!(matches!(err, MessageError::Deserialization(_)), "{err:?}");
        assert!(!err.is_untrusted_input());
        assert!(err.to_string().contains("missing field `bar`"));
    }

    #[test]
    fn unserializable_value_is_serialization_error() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys cannot be JSON object keys");
        let err = verifier().generate(&map).unwrap_err();
        assert!(matches!(err, MessageError::Serialization(_)), "{err:?}");
    }

    #[test]
    fn verified_returns_none_for_tampering() {
        let verifier = verifier();
        let token = verifier.generate(&data()).unwrap();
        assert_eq!(verifier.verified::<Value>(&token).unwrap(), Some(data()));
        assert_eq!(verifier.verified::<Value>("purejunk").unwrap(), None);
        assert_eq!(verifier.verified::<Value>("").unwrap(), None);
    }

    #[test]
    fn verified_still_raises_deserialization_errors() {
        let verifier = verifier();
        let token = verifier.generate("not a number").unwrap();
        assert!(matches!(
            verifier.verified::<u32>(&token),
            Err(MessageError::Deserialization(_))
        ));
    }

    #[test]
    fn alternative_serializer_round_trips() {
        let verifier = MessageVerifier::with_serializer(SECRET, YamlSerializer).unwrap();
        let value = json!({"foo": 123, "bar": "2010-01-01T00:00:00.000Z"});
        let token = verifier.generate(&value).unwrap();
        assert_eq!(verifier.verify::<Value>(&token).unwrap(), value);
    }

    #[test]
    fn tokens_only_read_by_matching_serializer() {
        let json = verifier();
        let cbor = MessageVerifier::with_serializer(SECRET, CborSerializer).unwrap();
        let value: HashMap<String, String> = [("some".to_owned(), "data".to_owned())].into();

        let json_token = json.generate(&value).unwrap();
        let cbor_token = cbor.generate(&value).unwrap();
        assert_ne!(json_token, cbor_token);

        assert_eq!(cbor.verify::<HashMap<String, String>>(&cbor_token).unwrap(), value);
        assert_not_verified_by(&cbor, &json_token);
        assert_not_verified_by(&json, &cbor_token);
    }

    #[test]
    fn json_token_rejected_by_yaml_verifier() {
        // YAML parses JSON, so only the signature can tell the formats apart.
        let yaml = MessageVerifier::with_serializer(SECRET, YamlSerializer).unwrap();
        let token = verifier().generate(&json!({"some": "data"})).unwrap();
        assert_not_verified_by(&yaml, &token);
        assert_eq!(yaml.verified::<Value>(&token).unwrap(), None);

        let yaml_token = yaml.generate(&json!({"some": "data"})).unwrap();
        assert_not_verified(&verifier(), yaml_token);
    }

    #[test]
    fn same_bytes_sign_differently_per_serializer() {
        let json = verifier();
        let yaml = MessageVerifier::with_serializer(SECRET, YamlSerializer).unwrap();
        let payload = encoding::encode(br#"{"some":"data"}"#);
        assert_ne!(
            json.generate_digest(&payload).unwrap(),
            yaml.generate_digest(&payload).unwrap()
        );
    }

    fn assert_not_verified_by<S: Serializer>(verifier: &MessageVerifier<S>, token: &str) {
        let result = verifier.verify::<Value>(token);
        assert!(
            matches!(result, Err(MessageError::InvalidSignature)),
            "expected invalid signature, got {result:?}"
        );
        assert!(!verifier.is_valid_message(token));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reuse() {
        let verifier = Arc::new(verifier());
        let handles: Vec<_> = (0..32u64)
            .map(|i| {
                let verifier = Arc::clone(&verifier);
                tokio::spawn(async move {
                    let token = verifier.generate(&json!({"user_id": i})).unwrap();
                    verifier.verify::<Value>(&token).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), json!({"user_id": i}));
        }
    }
}
