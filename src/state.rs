use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::services::google_service::GoogleVerifier;
use crate::services::notification_service::Mailer;
use crate::services::session_store::SessionStore;
use crate::utils::AppError;

/// Shared by every actix worker through `web::Data<AppState>`.
pub struct AppState {
    /// None when no backend is configured; data routes then answer 503.
    pub store: Option<Arc<dyn DocumentStore>>,
    pub sessions: SessionStore,
    pub mailer: Arc<dyn Mailer>,
    pub google: Arc<dyn GoogleVerifier>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        store: Option<Arc<dyn DocumentStore>>,
        mailer: Arc<dyn Mailer>,
        google: Arc<dyn GoogleVerifier>,
        config: AppConfig,
    ) -> Self {
        AppState {
            store,
            sessions: SessionStore::new(config.session_ttl_hours),
            mailer,
            google,
            config,
        }
    }

    pub fn store(&self) -> Result<&dyn DocumentStore, AppError> {
        self.store
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("Backend storage is not configured".to_string()))
    }
}
