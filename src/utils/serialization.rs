// src/utils/serialization.rs
//! Serialization helpers for compact JWS tokens.
//!
//! Provides:
//! - Splitting a `header.claims.signature` token into its segments
//! - Decoding a base64url segment into a JSON value

use serde::de::DeserializeOwned;

/// Decodes the claims segment of a compact token **without** verifying its
/// signature.
///
/// # Arguments
/// * `token` - `base64url(header).base64url(claims).base64url(signature)`
///
/// # Returns
/// - `Ok(T)` with the deserialized claims
/// - `Err(String)` if the token does not have three segments or the claims
///   segment is not base64url-encoded JSON
///
/// # Security
/// Only use the result for display or logging. Trust decisions require a
/// verified decode with the issuer's public key.
pub fn peek_claims<T: DeserializeOwned>(token: &str) -> Result<T, String> {
    let mut segments = token.split('.');
    let (Some(_header), Some(claims), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err("expected three dot-separated segments".to_string());
    };

    let bytes = base64::decode_config(claims, base64::URL_SAFE_NO_PAD)
        .map_err(|e| format!("Base64 decoding failed: {}", e))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("Deserialization failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn reads_claims_segment() {
        let claims = base64::encode_config(br#"{"sub":"earn","amount":5}"#, base64::URL_SAFE_NO_PAD);
        let token = format!("e30.{claims}.c2ln");
        let value: Value = peek_claims(&token).unwrap();
        assert_eq!(value, json!({ "sub": "earn", "amount": 5 }));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(peek_claims::<Value>("a.b").is_err());
        assert!(peek_claims::<Value>("a.b.c.d").is_err());
    }
}
