// src/wallet/key_management.rs
//! Application signing credentials.
//!
//! The application, not the ecosystem SDK, owns the private key that
//! authorizes its users' actions. This module holds that key in memory and
//! lends it to the request builder one call at a time.

use crate::error::RequestError;
use crate::settings::Settings;
use std::fmt;
use std::path::Path;

/// Issuer identity plus the PEM private key it signs with.
///
/// # Security Notes
/// - The key bytes are never logged; `Debug` redacts them
/// - Cloning copies the key; prefer sharing behind an `Arc`
#[derive(Clone)]
pub struct AppCredentials {
    app_id: String,
    private_key_pem: Vec<u8>,
}

impl AppCredentials {
    pub fn new(app_id: impl Into<String>, private_key_pem: impl Into<Vec<u8>>) -> Self {
        AppCredentials {
            app_id: app_id.into(),
            private_key_pem: private_key_pem.into(),
        }
    }

    /// Reads the PEM file named by `settings.private_key_path`.
    ///
    /// # Errors
    /// `RequestError::Configuration` if the file cannot be read or is empty.
    pub fn from_settings(settings: &Settings) -> Result<Self, RequestError> {
        Self::from_pem_file(&settings.app_id, &settings.private_key_path)
    }

    pub fn from_pem_file(app_id: &str, path: impl AsRef<Path>) -> Result<Self, RequestError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            RequestError::Configuration(format!("cannot read private key {}: {e}", path.display()))
        })?;
        if pem.is_empty() {
            return Err(RequestError::Configuration(format!(
                "private key file {} is empty",
                path.display()
            )));
        }
        Ok(Self::new(app_id, pem))
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub(crate) fn private_key(&self) -> &[u8] {
        &self.private_key_pem
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_pem_from_disk() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rsa_private.pem");
        let credentials = AppCredentials::from_pem_file("test-app", path).unwrap();
        assert_eq!(credentials.app_id(), "test-app");
        assert!(credentials.private_key().starts_with(b"-----BEGIN"));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = AppCredentials::from_pem_file("test-app", "/nonexistent/key.pem").unwrap_err();
        assert!(matches!(err, RequestError::Configuration(_)));
    }

    #[test]
    fn debug_output_hides_key() {
        let credentials = AppCredentials::new("test-app", b"secret".to_vec());
        let printed = format!("{credentials:?}");
        assert!(!printed.contains("secret"));
    }
}
