// src/models/assertion.rs
//! Encoded assertions exchanged with the ecosystem service.

use crate::models::action::ActionKind;
use crate::utils::serialization::peek_claims;
use serde::de::DeserializeOwned;
use std::fmt;

/// A signed action assertion, `base64url(header).base64url(claims).base64url(signature)`.
///
/// Single-use: submitting takes it by value, and it is dropped once the
/// request outcome arrives. It is deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct SignedAssertion {
    action: ActionKind,
    token: String,
}

impl SignedAssertion {
    pub(crate) fn new(action: ActionKind, token: String) -> Self {
        SignedAssertion { action, token }
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Token returned by the service attesting that an action completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationAssertion(String);

impl ConfirmationAssertion {
    pub fn new(token: impl Into<String>) -> Self {
        ConfirmationAssertion(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the confirmation's claims without verifying the service's
    /// signature. Suitable for display only.
    pub fn peek_claims<T: DeserializeOwned>(&self) -> Result<T, String> {
        peek_claims(&self.0)
    }
}

impl fmt::Display for ConfirmationAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
