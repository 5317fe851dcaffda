// src/error.rs
//! Error taxonomy for building and submitting signed requests.
//!
//! Every failure a caller can observe is one of the [`RequestError`] variants.
//! Transports report their own [`ServiceError`], which is folded into
//! `RequestError` at the submission boundary.

use thiserror::Error;

/// Errors surfaced by the request builder, the submission flow and the
/// ecosystem client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Missing or invalid issuer, key, session or action payload.
    /// Not retriable: the caller must fix its input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Signing failed (malformed key, unsupported algorithm).
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The transport could not reach the service.
    #[error("network error: {0}")]
    Network(String),

    /// The service declined the action, e.g. unknown peer or insufficient
    /// balance.
    #[error("rejected by service ({code}): {message}")]
    Rejected { code: u32, message: String },

    /// No response arrived within the caller's deadline.
    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),
}

impl RequestError {
    /// Whether repeating the same request may succeed.
    ///
    /// The library never retries on its own; this only informs the caller's
    /// retry policy.
    pub fn is_retriable(&self) -> bool {
        matches!(self, RequestError::Network(_) | RequestError::Timeout(_))
    }
}

/// Failure reported by a [`Transport`](crate::ledger::transport::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Network(String),

    #[error("service rejected request ({code}): {message}")]
    Rejected { code: u32, message: String },
}

impl From<ServiceError> for RequestError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Network(reason) => RequestError::Network(reason),
            ServiceError::Rejected { code, message } => RequestError::Rejected { code, message },
        }
    }
}

impl From<config::ConfigError> for RequestError {
    fn from(err: config::ConfigError) -> Self {
        RequestError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn only_transport_failures_are_retriable() {
        assert!(RequestError::Network("reset".into()).is_retriable());
        assert!(RequestError::Timeout(Duration::from_secs(2)).is_retriable());
        assert!(!RequestError::Configuration("no key".into()).is_retriable());
        assert!(!RequestError::Encoding("bad pem".into()).is_retriable());
        assert!(!RequestError::Rejected { code: 4041, message: "unknown peer".into() }.is_retriable());
    }

    #[test]
    fn service_rejection_keeps_code_and_message() {
        let err: RequestError = ServiceError::Rejected {
            code: 4001,
            message: "insufficient balance".into(),
        }
        .into();
        assert_eq!(
            err,
            RequestError::Rejected { code: 4001, message: "insufficient balance".into() }
        );
    }
}
