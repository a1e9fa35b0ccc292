use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ClientError;

pub const AUTH_SESSION_KEY: &str = "auth_session";
pub const DEVICE_ID_KEY: &str = "device_id";

/// Cache key of the last known document for an account.
pub fn document_key(email: &str) -> String {
    format!("userdoc:{}", email)
}

/// Device-local key/value storage: one JSON file per key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }

    /// None when the key was never written. A present but unreadable
    /// entry is an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ClientError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ClientError> {
        fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string(value)?;
        // Entries are replaced atomically
        let tmp = self.path(&format!("{}.tmp", key));
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), ClientError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserDocument;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        assert_eq!(store.get::<String>("missing").unwrap(), None);

        let mut doc = UserDocument::default();
        doc.business_profile.name = "Studio".into();
        let key = document_key("owner@x.com");
        store.set(&key, &doc).unwrap();
        assert_eq!(store.get::<UserDocument>(&key).unwrap(), Some(doc));

        store.remove(&key).unwrap();
        store.remove(&key).unwrap();
        assert_eq!(store.get::<UserDocument>(&key).unwrap(), None);
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        fs::write(dir.path().join("auth_session.json"), "{ broken").unwrap();
        assert!(matches!(
            store.get::<serde_json::Value>(AUTH_SESSION_KEY),
            Err(ClientError::Decode(_))
        ));
    }
}
