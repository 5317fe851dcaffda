// src/lib.rs

//! # Ecosystem Client
//!
//! Builds signed JWT assertions that authorize economic actions (register,
//! earn, spend, pay-to-user) and submits them to the ecosystem service.
//!
//! ## Layout
//! 1. **Models**: claim set, actions, assertions, demo user ids
//! 2. **Services**: request builder, single-shot submission, ecosystem client
//! 3. **Ledger**: the `Transport` capability and its HTTP implementation
//! 4. **Wallet**: the application's signing credentials
//! 5. **Settings**: layered configuration

pub mod error;
pub mod ledger;     // Delivery of assertions to the service
pub mod models;     // Data structures
pub mod services;   // Assertion building, submission, client flow
pub mod settings;   // Configuration loading
pub mod utils;      // Key parsing and token helpers
pub mod wallet;     // Application credentials

pub use error::{RequestError, ServiceError};
pub use ledger::http_client::HttpTransport;
pub use ledger::transport::Transport;
pub use models::action::ActionKind;
pub use models::assertion::{ConfirmationAssertion, SignedAssertion};
pub use models::claims::{ActionFields, ClaimSet, Offer, Party};
pub use services::ecosystem::EcosystemClient;
pub use services::request_builder::SignedRequestBuilder;
pub use services::submission::{CallbackContext, CompletionPump, CompletionQueue, RequestOutcome};
pub use utils::crypto::SigningAlgorithm;
pub use wallet::key_management::AppCredentials;
