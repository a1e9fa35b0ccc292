use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::api::Backend;
use super::error::ClientError;
use super::storage::{LocalStore, AUTH_SESSION_KEY};
use crate::models::AccountInfo;
use crate::services::auth_service::AuthResponse;

/// What survives a restart of the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub email: String,
}

/// Holds the session token. `is_authenticated()` is simply "a token is held".
pub struct AuthContext {
    backend: Arc<dyn Backend>,
    storage: LocalStore,
    session: RwLock<Option<StoredSession>>,
    loading: AtomicBool,
}

impl AuthContext {
    pub fn new(backend: Arc<dyn Backend>, storage: LocalStore) -> Self {
        AuthContext {
            backend,
            storage,
            session: RwLock::new(None),
            loading: AtomicBool::new(true),
        }
    }

    /// Restores the token saved by a previous run. Unreadable storage leaves
    /// the context unauthenticated; the loading flag is cleared either way.
    pub fn restore(&self) -> Option<StoredSession> {
        let restored = match self.storage.get::<StoredSession>(AUTH_SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("⚠️  Could not restore session, starting signed out: {}", e);
                if let Err(e) = self.storage.remove(AUTH_SESSION_KEY) {
                    log::warn!("⚠️  Could not clear stored session: {}", e);
                }
                None
            }
        };

        self.set_session(restored.clone());
        self.loading.store(false, Ordering::SeqCst);
        restored
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn session(&self) -> Option<StoredSession> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    pub fn email(&self) -> Option<String> {
        self.session().map(|s| s.email)
    }

    fn set_session(&self, session: Option<StoredSession>) {
        self.backend.set_token(session.as_ref().map(|s| s.token.clone()));
        if let Ok(mut current) = self.session.write() {
            *current = session;
        }
    }

    fn accept(&self, response: AuthResponse) -> AccountInfo {
        let session = StoredSession {
            token: response.token,
            email: response.user.email.clone(),
        };
        if let Err(e) = self.storage.set(AUTH_SESSION_KEY, &session) {
            log::warn!("⚠️  Session not persisted, it will not survive a restart: {}", e);
        }
        self.set_session(Some(session));
        self.loading.store(false, Ordering::SeqCst);
        response.user
    }

    pub async fn login_email(&self, email: &str, password: &str) -> Result<AccountInfo, ClientError> {
        let response = self.backend.login_email(email, password).await?;
        Ok(self.accept(response))
    }

    pub async fn signup(&self, email: &str, password: &str, name: Option<&str>) -> Result<AccountInfo, ClientError> {
        let response = self.backend.signup(email, password, name).await?;
        Ok(self.accept(response))
    }

    pub async fn login_google(&self, credential: &str) -> Result<AccountInfo, ClientError> {
        let response = self.backend.login_google(credential).await?;
        Ok(self.accept(response))
    }

    /// Asks the backend whether the held token is still valid and signs out
    /// locally when it is not. Network errors keep the token.
    pub async fn validate(&self) -> Result<bool, ClientError> {
        if !self.is_authenticated() {
            return Ok(false);
        }
        match self.backend.me().await? {
            Some(_) => Ok(true),
            None => {
                log::info!("🔒 Stored session expired, signing out");
                self.clear_local();
                Ok(false)
            }
        }
    }

    fn clear_local(&self) {
        self.set_session(None);
        if let Err(e) = self.storage.remove(AUTH_SESSION_KEY) {
            log::warn!("⚠️  Could not clear stored session: {}", e);
        }
    }

    /// Ends the server session and forgets the local token. Local state is
    /// cleared even when the server call fails; that failure is returned.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let server = if self.is_authenticated() {
            self.backend.logout().await
        } else {
            Ok(())
        };
        self.clear_local();
        server
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeBackend;
    use std::fs;

    fn context(backend: Arc<FakeBackend>, dir: &tempfile::TempDir) -> AuthContext {
        AuthContext::new(backend, LocalStore::new(dir.path()))
    }

    #[tokio::test]
    async fn test_login_persists_and_restores() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());

        let auth = context(backend.clone(), &dir);
        assert!(auth.is_loading());
        auth.login_email("owner@x.com", "secret123").await.unwrap();
        assert!(auth.is_authenticated());
        assert!(!auth.is_loading());

        let restarted = context(backend.clone(), &dir);
        let restored = restarted.restore().unwrap();
        assert_eq!(restored.email, "owner@x.com");
        assert!(restarted.is_authenticated());
        assert_eq!(backend.token().as_deref(), Some(restored.token.as_str()));
    }

    #[tokio::test]
    async fn test_corrupt_storage_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("auth_session.json"), "not json").unwrap();

        let auth = context(Arc::new(FakeBackend::default()), &dir);
        assert!(auth.restore().is_none());
        assert!(!auth.is_loading());
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_local_state_even_when_server_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let auth = context(backend.clone(), &dir);
        auth.login_email("owner@x.com", "secret123").await.unwrap();

        backend.set_offline(true);
        assert!(auth.logout().await.is_err());
        assert!(!auth.is_authenticated());
        assert!(backend.token().is_none());

        let restarted = context(backend, &dir);
        assert!(restarted.restore().is_none());
    }

    #[tokio::test]
    async fn test_validate_drops_revoked_session() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let auth = context(backend.clone(), &dir);
        auth.login_email("owner@x.com", "secret123").await.unwrap();
        assert!(auth.validate().await.unwrap());

        backend.revoke_sessions();
        assert!(!auth.validate().await.unwrap());
        assert!(!auth.is_authenticated());
    }
}
