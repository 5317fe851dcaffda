// src/ledger/transport.rs
//! The capability for delivering assertions to the ecosystem service.

use crate::error::ServiceError;
use crate::models::action::ActionKind;
use crate::models::assertion::{ConfirmationAssertion, SignedAssertion};
use futures::future::BoxFuture;

/// Sends one signed assertion to the ledger/authorization service.
///
/// Implementations perform exactly one outbound call per `send` and never
/// retry. Business rejections (unknown peer, insufficient balance) are
/// reported as [`ServiceError::Rejected`]; everything that prevented an
/// answer is [`ServiceError::Network`].
///
/// # Example
/// ```ignore
/// let confirmation = transport.send(ActionKind::Spend, &assertion).await?;
/// ```
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        action: ActionKind,
        assertion: &'a SignedAssertion,
    ) -> BoxFuture<'a, Result<ConfirmationAssertion, ServiceError>>;
}
