// src/models/claims.rs
//! Claim set carried by a signed action assertion.
//!
//! Defines the JWT payload structure: the standard assertion fields
//! (`iss`, `iat`, `exp`, `sub`) followed by the action-specific payload
//! (`user_id`, `device_id`, `offer`, `sender`, `recipient`).

use crate::models::action::ActionKind;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Length of generated offer identifiers.
const OFFER_ID_LEN: usize = 10;

/// The payload of an action assertion.
///
/// Built fresh for every action invocation and never mutated after signing.
/// Optional fields are omitted from the encoded token when absent, so the
/// decoded claims contain exactly what was supplied.
///
/// # Serialization
/// ```json
/// {
///   "iss": "my-app",
///   "iat": 1700000000,
///   "exp": 1700086400,
///   "sub": "spend",
///   "offer": { "id": "X1", "amount": 10 },
///   "sender": { "user_id": "alice", "title": "Sticker", "description": "A sticker" }
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    /// Issuer: the application id registered with the ecosystem
    pub iss: String,

    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,

    /// Expiration, seconds since the Unix epoch
    pub exp: i64,

    /// The requested action
    pub sub: ActionKind,

    /// Signed-in user, present on `register` assertions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Optional device binding for `register`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<Offer>,

    /// Paying party (`spend`, `pay_to_user`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Party>,

    /// Receiving party (`earn`, `pay_to_user`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Party>,
}

/// An economic action descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Unique per invocation; the service treats assertions with the same
    /// offer id as the same order.
    pub id: String,

    /// Amount in whole Kin
    pub amount: u64,
}

impl Offer {
    pub fn new(id: impl Into<String>, amount: u64) -> Self {
        Offer { id: id.into(), amount }
    }

    /// Creates an offer with a freshly generated random identifier.
    pub fn generate(amount: u64) -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(OFFER_ID_LEN)
            .map(char::from)
            .collect();
        Offer { id, amount }
    }
}

/// One side of a transfer, as shown in the user's order history.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Party {
    pub fn user(user_id: impl Into<String>) -> Self {
        Party { user_id: Some(user_id.into()), ..Party::default() }
    }

    /// Order-history entry without an explicit user; the builder fills the
    /// subject user in where the action allows it.
    pub fn described(title: impl Into<String>, description: impl Into<String>) -> Self {
        Party {
            user_id: None,
            title: Some(title.into()),
            description: Some(description.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Action-specific fields supplied by the caller to
/// [`SignedRequestBuilder::build_assertion`](crate::services::request_builder::SignedRequestBuilder::build_assertion).
///
/// Which fields are required depends on the [`ActionKind`]:
/// - `register`: no offer, optional `device_id`
/// - `spend`: `offer` and `sender`
/// - `earn`: `offer` and `recipient`
/// - `pay_to_user`: `offer`, `sender` and a `recipient` naming the peer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFields {
    pub device_id: Option<String>,
    pub offer: Option<Offer>,
    pub sender: Option<Party>,
    pub recipient: Option<Party>,
}

impl ActionFields {
    pub fn register(device_id: Option<String>) -> Self {
        ActionFields { device_id, ..ActionFields::default() }
    }

    pub fn spend(offer: Offer, sender: Party) -> Self {
        ActionFields { offer: Some(offer), sender: Some(sender), ..ActionFields::default() }
    }

    pub fn earn(offer: Offer, recipient: Party) -> Self {
        ActionFields { offer: Some(offer), recipient: Some(recipient), ..ActionFields::default() }
    }

    pub fn pay_to_user(offer: Offer, sender: Party, recipient: Party) -> Self {
        ActionFields {
            device_id: None,
            offer: Some(offer),
            sender: Some(sender),
            recipient: Some(recipient),
        }
    }
}
