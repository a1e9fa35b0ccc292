//! Test doubles shared by the unit and handler tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::database::MemoryStore;
use crate::services::google_service::{GoogleIdentity, GoogleVerifier};
use crate::services::notification_service::{Mailer, OutgoingEmail};
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Accepts credentials of the form `google:<email>`.
pub struct StaticGoogleVerifier;

#[async_trait]
impl GoogleVerifier for StaticGoogleVerifier {
    async fn verify(&self, credential: &str) -> Result<GoogleIdentity, AppError> {
        match credential.strip_prefix("google:") {
            Some(email) => Ok(GoogleIdentity {
                google_id: format!("gid-{}", email),
                email: email.to_string(),
                name: Some("Google User".to_string()),
            }),
            None => Err(AppError::Unauthorized("Invalid Google credential".to_string())),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

pub fn test_state_with_mailer(mailer: Arc<dyn Mailer>) -> AppState {
    AppState::new(
        Some(Arc::new(MemoryStore::new())),
        mailer,
        Arc::new(StaticGoogleVerifier),
        test_config(),
    )
}

pub fn test_state() -> AppState {
    test_state_with_mailer(Arc::new(RecordingMailer::default()))
}

/// State without any store, as when the backend is not configured.
pub fn unconfigured_state() -> AppState {
    AppState::new(
        None,
        Arc::new(RecordingMailer::default()),
        Arc::new(StaticGoogleVerifier),
        test_config(),
    )
}
