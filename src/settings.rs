// src/settings.rs
//! Application settings.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional `essa.toml` (or `.json`/`.yaml`) in the working directory
//! 3. `ESSA_*` environment variables, including those loaded from `.env`
//!
//! ## Keys
//! - `ESSA_APP_ID`: Application id, the `iss` of every assertion (required)
//! - `ESSA_KEY_ID`: `kid` advertised in the assertion header (required)
//! - `ESSA_PRIVATE_KEY_PATH`: PEM private key file (required)
//! - `ESSA_ALGORITHM`: `RS512` (default) or `ES256`
//! - `ESSA_SERVICE_URL`: Ecosystem service base URL
//! - `ESSA_REQUEST_TIMEOUT_SECS`: Per-request deadline (default: 30)
//! - `ESSA_USER_ID`: Demo user; generated when unset
//! - `ESSA_NEW_USER`: Start as the next demo user instead of `ESSA_USER_ID`
//! - `ESSA_PAY_TO_USER`: Peer to pay in the demo run, if any

use crate::error::RequestError;
use crate::utils::crypto::SigningAlgorithm;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_SERVICE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub app_id: String,
    pub key_id: String,
    pub private_key_path: String,
    #[serde(default)]
    pub algorithm: SigningAlgorithm,
    pub service_url: String,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub new_user: bool,
    #[serde(default)]
    pub pay_to_user: Option<String>,
}

impl Settings {
    /// Loads settings from `essa.*` and the process environment.
    ///
    /// # Errors
    /// `RequestError::Configuration` if a required key is missing or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, RequestError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("essa").required(false))
                .add_source(Environment::with_prefix("ESSA").try_parsing(true)),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, RequestError> {
        let settings: Settings = builder
            .set_default("service_url", DEFAULT_SERVICE_URL)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), RequestError> {
        for (name, value) in [
            ("app_id", &self.app_id),
            ("key_id", &self.key_id),
            ("private_key_path", &self.private_key_path),
        ] {
            if value.trim().is_empty() {
                return Err(RequestError::Configuration(format!("{name} must not be empty")));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(RequestError::Configuration("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
