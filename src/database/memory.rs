use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::DocumentStore;
use crate::models::{
    Account, ApiKey, Device, RatingRequest, SavePoint, SavePointSummary, UserDocument,
};
use crate::utils::AppError;

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    documents: HashMap<String, UserDocument>,
    devices: HashMap<(String, String), Device>,
    save_points: Vec<SavePoint>,
    api_keys: HashMap<String, ApiKey>,
    rating_requests: HashMap<String, RatingRequest>,
}

/// Process-local store with the same semantics as the MongoDB one.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.read()?.accounts.get(email).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if tables.accounts.contains_key(&account.email) {
            return Err(AppError::Conflict("An account with this email already exists".to_string()));
        }
        tables.accounts.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if let Some(existing) = tables.accounts.get_mut(&account.email) {
            *existing = account.clone();
        }
        Ok(())
    }

    async fn load_document(&self, email: &str) -> Result<Option<UserDocument>, AppError> {
        Ok(self.read()?.documents.get(email).cloned())
    }

    async fn save_document(&self, email: &str, document: &UserDocument) -> Result<(), AppError> {
        self.write()?.documents.insert(email.to_string(), document.clone());
        Ok(())
    }

    async fn upsert_device(&self, device: &Device) -> Result<(), AppError> {
        let mut tables = self.write()?;
        let key = (device.email.clone(), device.device_id.clone());
        match tables.devices.get_mut(&key) {
            Some(existing) => {
                existing.device_name = device.device_name.clone();
                existing.last_seen = device.last_seen;
            }
            None => {
                tables.devices.insert(key, device.clone());
            }
        }
        Ok(())
    }

    async fn insert_save_point(&self, save_point: &SavePoint) -> Result<(), AppError> {
        self.write()?.save_points.push(save_point.clone());
        Ok(())
    }

    async fn list_save_points(&self, email: &str) -> Result<Vec<SavePointSummary>, AppError> {
        let tables = self.read()?;
        let mut summaries: Vec<SavePointSummary> = tables
            .save_points
            .iter()
            .filter(|sp| sp.email == email)
            .map(SavePointSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn find_save_point(&self, email: &str, id: &str) -> Result<Option<SavePoint>, AppError> {
        Ok(self
            .read()?
            .save_points
            .iter()
            .find(|sp| sp.email == email && sp.id == id)
            .cloned())
    }

    async fn delete_save_point(&self, email: &str, id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let before = tables.save_points.len();
        tables.save_points.retain(|sp| !(sp.email == email && sp.id == id));
        Ok(tables.save_points.len() < before)
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), AppError> {
        self.write()?.api_keys.insert(key.key_id.clone(), key.clone());
        Ok(())
    }

    async fn find_api_key(&self, key_id: &str) -> Result<Option<ApiKey>, AppError> {
        Ok(self.read()?.api_keys.get(key_id).cloned())
    }

    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKey>, AppError> {
        let tables = self.read()?;
        let mut keys: Vec<ApiKey> = tables
            .api_keys
            .values()
            .filter(|k| k.email == email)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn delete_api_key(&self, email: &str, key_id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let owned = tables.api_keys.get(key_id).map(|k| k.email == email).unwrap_or(false);
        if owned {
            tables.api_keys.remove(key_id);
        }
        Ok(owned)
    }

    async fn touch_api_key(&self, key_id: &str, at: i64) -> Result<(), AppError> {
        if let Some(key) = self.write()?.api_keys.get_mut(key_id) {
            key.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn insert_rating_request(&self, request: &RatingRequest) -> Result<(), AppError> {
        self.write()?
            .rating_requests
            .insert(request.token.clone(), request.clone());
        Ok(())
    }

    async fn find_rating_request(&self, token: &str) -> Result<Option<RatingRequest>, AppError> {
        Ok(self.read()?.rating_requests.get(token).cloned())
    }

    async fn mark_rating_request_used(&self, token: &str, at: i64) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        match tables.rating_requests.get_mut(token) {
            Some(request) if request.used_at.is_none() => {
                request.used_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
