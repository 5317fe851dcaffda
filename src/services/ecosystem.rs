// src/services/ecosystem.rs
//! Ecosystem client: session start plus the signed economic actions.
//!
//! Ties together the app's [`AppCredentials`], a [`SignedRequestBuilder`]
//! and a [`Transport`] so a host can run the typical flow
//! `start → login → build offer → submit` as a chain of awaits:
//!
//! ```ignore
//! client.start("user_42_0")?;
//! client.login().await?;
//! let confirmation = client.spend(10, "Sticker", "A shiny sticker").await?;
//! ```

use crate::error::RequestError;
use crate::ledger::transport::Transport;
use crate::models::action::ActionKind;
use crate::models::assertion::SignedAssertion;
use crate::models::claims::{ActionFields, Offer, Party};
use crate::services::request_builder::SignedRequestBuilder;
use crate::services::submission::{deliver, RequestOutcome};
use crate::wallet::key_management::AppCredentials;
use log::info;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Client for one application and, once started, one user.
pub struct EcosystemClient {
    credentials: Arc<AppCredentials>,
    builder: SignedRequestBuilder,
    transport: Arc<dyn Transport>,
    deadline: Duration,
    device_id: Option<String>,
    /// Set once by [`EcosystemClient::start`]; later starts are no-ops.
    session: OnceCell<String>,
}

impl EcosystemClient {
    pub fn new(
        credentials: AppCredentials,
        builder: SignedRequestBuilder,
        transport: Arc<dyn Transport>,
        deadline: Duration,
    ) -> Self {
        EcosystemClient {
            credentials: Arc::new(credentials),
            builder,
            transport,
            deadline,
            device_id: None,
            session: OnceCell::new(),
        }
    }

    /// Binds `register` assertions to a device.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Starts the session for `user_id`.
    ///
    /// Idempotent: only the first successful call takes effect, and every
    /// call returns the user the session was started with.
    ///
    /// # Errors
    /// `Configuration` if `user_id` is empty.
    pub fn start(&self, user_id: &str) -> Result<&str, RequestError> {
        if user_id.trim().is_empty() {
            return Err(RequestError::Configuration("user id is required".into()));
        }
        let active = self.session.get_or_init(|| {
            info!("starting ecosystem session for {user_id} (app {})", self.credentials.app_id());
            user_id.to_string()
        });
        Ok(active.as_str())
    }

    pub fn active_user(&self) -> Option<&str> {
        self.session.get().map(String::as_str)
    }

    /// Signs the active user in.
    pub async fn login(&self) -> RequestOutcome {
        self.perform(ActionKind::Register, ActionFields::register(self.device_id.clone()))
            .await
    }

    /// Pays the active user `amount` from the app.
    pub async fn earn(&self, amount: u64, title: &str, description: &str) -> RequestOutcome {
        let fields = ActionFields::earn(Offer::generate(amount), Party::described(title, description));
        self.perform(ActionKind::Earn, fields).await
    }

    /// Charges the active user `amount`.
    pub async fn spend(&self, amount: u64, title: &str, description: &str) -> RequestOutcome {
        let fields = ActionFields::spend(Offer::generate(amount), Party::described(title, description));
        self.perform(ActionKind::Spend, fields).await
    }

    /// Transfers `amount` from the active user to `recipient_user_id`.
    ///
    /// Whether the peer exists is for the service to decide; an unknown peer
    /// comes back as `Rejected`.
    pub async fn pay_to_user(
        &self,
        recipient_user_id: &str,
        amount: u64,
        title: &str,
        description: &str,
    ) -> RequestOutcome {
        let fields = ActionFields::pay_to_user(
            Offer::generate(amount),
            Party::described(title, description),
            Party::user(recipient_user_id)
                .with_title(title)
                .with_description(format!("From {}", self.active_user().unwrap_or_default())),
        );
        self.perform(ActionKind::PayToUser, fields).await
    }

    /// Builds and submits `action`, handing the outcome to `callback`.
    ///
    /// Build failures reach the callback too, without any network call.
    pub fn perform_with_callback<F>(&self, action: ActionKind, fields: ActionFields, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(RequestOutcome) + Send + 'static,
    {
        match self.build(action, fields) {
            Ok(assertion) => self
                .builder
                .submit(assertion, Arc::clone(&self.transport), self.deadline, callback),
            Err(err) => {
                let context = self.builder.callback_context.clone();
                tokio::spawn(async move { deliver(&context, callback, Err(err)) })
            }
        }
    }

    async fn perform(&self, action: ActionKind, fields: ActionFields) -> RequestOutcome {
        let assertion = self.build(action, fields)?;
        self.builder
            .submit_async(assertion, self.transport.as_ref(), self.deadline)
            .await
    }

    fn build(&self, action: ActionKind, fields: ActionFields) -> Result<SignedAssertion, RequestError> {
        let user = self
            .active_user()
            .ok_or_else(|| RequestError::Configuration("session not started".into()))?;
        self.builder.build_assertion(
            action,
            self.credentials.app_id(),
            user,
            self.credentials.private_key(),
            fields,
        )
    }
}
