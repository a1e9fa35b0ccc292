//! Sync client: keeps the session token and the account's document on the
//! device and mirrors changes to the backend.

pub mod api;
pub mod auth;
pub mod device;
pub mod error;
pub mod storage;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, Backend};
pub use auth::{AuthContext, StoredSession};
pub use error::ClientError;
pub use storage::LocalStore;
pub use sync::{LoadSource, SaveOutcome, StateContainer};

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::var;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, without `/api/v1`
    pub base_url: String,
    pub request_timeout: Duration,
    pub save_debounce: Duration,
    pub storage_dir: PathBuf,
    pub device_name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: "http://localhost:3002".to_string(),
            request_timeout: Duration::from_secs(10),
            save_debounce: Duration::from_millis(1500),
            storage_dir: PathBuf::from(".appointment-crm"),
            device_name: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: var("API_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: var("API_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            save_debounce: var("SAVE_DEBOUNCE_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.save_debounce),
            storage_dir: var("CLIENT_STORAGE_DIR").map(PathBuf::from).unwrap_or(defaults.storage_dir),
            device_name: var("DEVICE_NAME"),
        }
    }
}

/// Ties the auth context to the state container of the signed-in account.
pub struct AppClient {
    config: ClientConfig,
    backend: Arc<dyn Backend>,
    storage: LocalStore,
    auth: AuthContext,
    container: RwLock<Option<StateContainer>>,
}

impl AppClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let backend = Arc::new(ApiClient::new(&config.base_url, config.request_timeout)?);
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: ClientConfig, backend: Arc<dyn Backend>) -> Self {
        let storage = LocalStore::new(config.storage_dir.clone());
        AppClient {
            auth: AuthContext::new(backend.clone(), storage.clone()),
            config,
            backend,
            storage,
            container: RwLock::new(None),
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn container(&self) -> Option<StateContainer> {
        self.container.read().ok().and_then(|c| c.clone())
    }

    /// Restores the stored session, checks it with the backend and loads
    /// the account's data. An unreachable backend keeps the stored session.
    pub async fn start(&self) -> Result<Option<StateContainer>, ClientError> {
        if self.auth.restore().is_some() {
            if let Err(e) = self.auth.validate().await {
                log::warn!("⚠️  Could not validate session, continuing offline: {}", e);
            }
        }
        self.sync_session().await
    }

    /// Call after every auth change. Builds and loads the container for the
    /// signed-in account, or drops it when signed out.
    pub async fn sync_session(&self) -> Result<Option<StateContainer>, ClientError> {
        let email = match self.auth.email() {
            Some(email) => email,
            None => {
                self.replace_container(None);
                return Ok(None);
            }
        };

        if let Some(current) = self.container().filter(|c| c.email() == email) {
            current.load_once().await;
            return Ok(Some(current));
        }

        let container = StateContainer::new(
            self.backend.clone(),
            self.storage.clone(),
            &email,
            self.config.device_name.clone(),
            self.config.save_debounce,
        )?;
        self.replace_container(Some(container.clone()));
        container.load_once().await;
        Ok(Some(container))
    }

    fn replace_container(&self, container: Option<StateContainer>) {
        if let Ok(mut current) = self.container.write() {
            *current = container;
        }
    }

    /// Saves pending changes, then signs out locally and on the server.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(container) = self.container() {
            container.flush_now().await;
        }
        self.replace_container(None);
        self.auth.logout().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeBackend;
    use crate::models::NewClient;

    fn config(dir: &tempfile::TempDir) -> ClientConfig {
        ClientConfig {
            storage_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_login_then_restart_loads_same_account() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());

        let app = AppClient::with_backend(config(&dir), backend.clone());
        assert!(app.start().await.unwrap().is_none());

        app.auth().login_email("owner@x.com", "secret123").await.unwrap();
        let container = app.sync_session().await.unwrap().unwrap();
        container.add_client(NewClient { name: "Ana".into(), ..Default::default() }).unwrap();
        app.logout().await.unwrap();
        assert!(app.container().is_none());
        assert_eq!(backend.stored_document().unwrap().clients.len(), 1);

        app.auth().login_email("owner@x.com", "secret123").await.unwrap();
        let restarted = AppClient::with_backend(config(&dir), backend.clone());
        let container = restarted.start().await.unwrap().unwrap();
        assert_eq!(container.email(), "owner@x.com");
        assert_eq!(container.snapshot().clients[0].name, "Ana");
    }

    #[tokio::test]
    async fn test_offline_start_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let app = AppClient::with_backend(config(&dir), backend.clone());
        app.auth().login_email("owner@x.com", "secret123").await.unwrap();

        backend.set_offline(true);
        let restarted = AppClient::with_backend(config(&dir), backend.clone());
        let container = restarted.start().await.unwrap().unwrap();
        assert!(restarted.auth().is_authenticated());
        assert!(!container.is_loaded());

        backend.set_offline(false);
        let container = restarted.sync_session().await.unwrap().unwrap();
        assert!(container.is_loaded());
    }
}
