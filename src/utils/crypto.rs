// src/utils/crypto.rs
//! Signing-key handling for action assertions.
//!
//! Keys arrive as PEM text owned by the host application. They are parsed
//! per call and never retained.

use crate::error::RequestError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signature algorithms accepted for assertions.
///
/// # Variants
/// - `RS512`: RSA PKCS#1 v1.5 with SHA-512 (default)
/// - `ES256`: ECDSA P-256 with SHA-256; expects a PKCS#8 PEM private key
///
/// Names are matched case-insensitively, in settings as well as `parse`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum SigningAlgorithm {
    #[default]
    RS512,
    ES256,
}

impl SigningAlgorithm {
    pub fn jwt_algorithm(&self) -> Algorithm {
        match self {
            SigningAlgorithm::RS512 => Algorithm::RS512,
            SigningAlgorithm::ES256 => Algorithm::ES256,
        }
    }

    /// Parses a PEM private key for this algorithm.
    ///
    /// # Errors
    /// `RequestError::Encoding` if the PEM is malformed or holds the wrong key type.
    pub fn encoding_key(&self, private_key_pem: &[u8]) -> Result<EncodingKey, RequestError> {
        let parsed = match self {
            SigningAlgorithm::RS512 => EncodingKey::from_rsa_pem(private_key_pem),
            SigningAlgorithm::ES256 => EncodingKey::from_ec_pem(private_key_pem),
        };
        parsed.map_err(|e| RequestError::Encoding(format!("invalid {self} private key: {e}")))
    }

    /// Parses the matching PEM public key, for verifying assertions.
    pub fn decoding_key(&self, public_key_pem: &[u8]) -> Result<DecodingKey, RequestError> {
        let parsed = match self {
            SigningAlgorithm::RS512 => DecodingKey::from_rsa_pem(public_key_pem),
            SigningAlgorithm::ES256 => DecodingKey::from_ec_pem(public_key_pem),
        };
        parsed.map_err(|e| RequestError::Encoding(format!("invalid {self} public key: {e}")))
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningAlgorithm::RS512 => f.write_str("RS512"),
            SigningAlgorithm::ES256 => f.write_str("ES256"),
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RS512" => Ok(SigningAlgorithm::RS512),
            "ES256" => Ok(SigningAlgorithm::ES256),
            other => Err(RequestError::Encoding(format!("unsupported signing algorithm: {other}"))),
        }
    }
}

impl TryFrom<String> for SigningAlgorithm {
    type Error = RequestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_PRIVATE: &[u8] = include_bytes!("../../tests/fixtures/rsa_private.pem");
    const EC_PRIVATE: &[u8] = include_bytes!("../../tests/fixtures/ec_private.pem");

    #[test]
    fn parses_keys_for_matching_algorithm() {
        assert!(SigningAlgorithm::RS512.encoding_key(RSA_PRIVATE).is_ok());
        assert!(SigningAlgorithm::ES256.encoding_key(EC_PRIVATE).is_ok());
    }

    #[test]
    fn garbage_key_is_an_encoding_error() {
        let Err(err) = SigningAlgorithm::RS512.encoding_key(b"not a pem") else {
            panic!("garbage parsed as an RSA key");
        };
        assert!(matches!(err, RequestError::Encoding(_)));
    }

    #[test]
    fn unknown_algorithm_names_are_rejected() {
        assert_eq!("rs512".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::RS512);
        assert!(matches!("HS256".parse::<SigningAlgorithm>(), Err(RequestError::Encoding(_))));
    }

    #[test]
    fn deserializes_any_case() {
        let alg: SigningAlgorithm = serde_json::from_str("\"es256\"").unwrap();
        assert_eq!(alg, SigningAlgorithm::ES256);
        assert!(serde_json::from_str::<SigningAlgorithm>("\"none\"").is_err());
    }
}
