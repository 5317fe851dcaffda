// src/ledger/http_client.rs
//! HTTP transport for the ecosystem service.
//!
//! Maps each action onto its REST endpoint:
//! - `register` → `POST {base}/v1/users` with `{"sign_in_type": "jwt", "jwt": ...}`
//! - `earn` / `spend` / `pay_to_user` → `POST {base}/v1/offers/external/orders` with `{"jwt": ...}`
//!
//! A 2xx response body `{"jwt": ...}` carries the confirmation assertion.
//! 4xx bodies `{"code", "error", "message"}` are business rejections;
//! 5xx responses and connection failures are network errors.

use crate::error::ServiceError;
use crate::ledger::transport::Transport;
use crate::models::action::ActionKind;
use crate::models::assertion::{ConfirmationAssertion, SignedAssertion};
use futures::future::{BoxFuture, FutureExt};
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

/// Rejection code used when a 4xx body does not carry one.
const UNKNOWN_REJECTION_CODE: u32 = 0;

#[derive(Deserialize)]
struct ConfirmationBody {
    jwt: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Reqwest-backed [`Transport`].
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the service at `base_url`
    /// (e.g. `https://api.ecosystem.example`). A trailing `/` is ignored.
    pub fn new(base_url: &str) -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The URL an action's assertion is posted to.
    pub fn endpoint(&self, action: ActionKind) -> String {
        match action {
            ActionKind::Register => format!("{}/v1/users", self.base_url),
            ActionKind::Earn | ActionKind::Spend | ActionKind::PayToUser => {
                format!("{}/v1/offers/external/orders", self.base_url)
            }
        }
    }

    async fn post(
        &self,
        action: ActionKind,
        assertion: &SignedAssertion,
    ) -> Result<ConfirmationAssertion, ServiceError> {
        let body = match action {
            ActionKind::Register => json!({ "sign_in_type": "jwt", "jwt": assertion.as_str() }),
            _ => json!({ "jwt": assertion.as_str() }),
        };
        let url = self.endpoint(action);
        debug!("POST {url} ({action})");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        classify_response(status, &text)
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        action: ActionKind,
        assertion: &'a SignedAssertion,
    ) -> BoxFuture<'a, Result<ConfirmationAssertion, ServiceError>> {
        self.post(action, assertion).boxed()
    }
}

/// Turns a service response into a confirmation or a typed failure.
pub fn classify_response(status: StatusCode, body: &str) -> Result<ConfirmationAssertion, ServiceError> {
    if status.is_success() {
        let parsed: ConfirmationBody = serde_json::from_str(body)
            .map_err(|e| ServiceError::Network(format!("malformed confirmation body: {e}")))?;
        return Ok(ConfirmationAssertion::new(parsed.jwt));
    }

    if status.is_client_error() {
        let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(err) => (
                err.code.unwrap_or(UNKNOWN_REJECTION_CODE),
                err.message
                    .or(err.error)
                    .unwrap_or_else(|| status.to_string()),
            ),
            Err(_) => (UNKNOWN_REJECTION_CODE, status.to_string()),
        };
        return Err(ServiceError::Rejected { code, message });
    }

    Err(ServiceError::Network(format!("service responded with {status}")))
}
