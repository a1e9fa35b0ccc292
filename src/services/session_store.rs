use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::MAX_SESSION_TTL_HOURS;
use crate::utils::{generate_token, AppError};

#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Process-local token -> session map. Sessions do not survive a restart
/// and are not shared between instances.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::hours(ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS)),
        }
    }

    pub fn ttl_hours(&self) -> i64 {
        self.ttl.num_hours()
    }

    /// Issues a new opaque token for `email`.
    pub fn create(&self, email: &str) -> Result<String, AppError> {
        let token = generate_token();
        let session = Session {
            email: email.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions
            .write()
            .map_err(|_| AppError::Internal("session lock poisoned".to_string()))?
            .insert(token.clone(), session);
        Ok(token)
    }

    /// Email of a live session. Expired entries are removed on sight.
    pub fn resolve(&self, token: &str) -> Option<String> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().ok()?;
            match sessions.get(token) {
                Some(session) if session.expires_at > now => return Some(session.email.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(token);
        }
        None
    }

    /// Returns true when a session was removed. Unknown tokens are fine.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .map(|mut sessions| sessions.remove(token).is_some())
            .unwrap_or(false)
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        match self.sessions.write() {
            Ok(mut sessions) => {
                let before = sessions.len();
                sessions.retain(|_, s| s.expires_at > now);
                before - sessions.len()
            }
            Err(_) => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn expire_now(&self, token: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            if let Some(session) = sessions.get_mut(token) {
                session.expires_at = Utc::now() - Duration::seconds(1);
            }
        }
    }
}
