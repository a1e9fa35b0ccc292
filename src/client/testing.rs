//! In-process `Backend` used by the client tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::api::Backend;
use super::error::ClientError;
use crate::models::{
    AccountInfo, CreateSavePointRequest, RatingRequestBody, RatingRequestReceipt, SavePoint,
    SavePointSummary, UserDocument,
};
use crate::services::auth_service::AuthResponse;
use crate::utils::new_id;

#[derive(Default)]
pub struct FakeBackend {
    token: Mutex<Option<String>>,
    offline: AtomicBool,
    revoked: AtomicBool,
    document: Mutex<Option<UserDocument>>,
    saves: Mutex<Vec<UserDocument>>,
    save_delay: Mutex<Option<Duration>>,
    save_points: Mutex<Vec<SavePoint>>,
    rating_requests: Mutex<Vec<RatingRequestBody>>,
}

impl FakeBackend {
    pub fn with_document(document: UserDocument) -> Self {
        let backend = FakeBackend::default();
        *backend.document.lock().unwrap() = Some(document);
        backend
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn revoke_sessions(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = Some(delay);
    }

    pub fn saves(&self) -> Vec<UserDocument> {
        self.saves.lock().unwrap().clone()
    }

    pub fn stored_document(&self) -> Option<UserDocument> {
        self.document.lock().unwrap().clone()
    }

    pub fn rating_requests(&self) -> Vec<RatingRequestBody> {
        self.rating_requests.lock().unwrap().clone()
    }

    fn online(&self) -> Result<(), ClientError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ClientError::Network("backend unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn auth(&self, email: &str) -> Result<AuthResponse, ClientError> {
        self.online()?;
        self.revoked.store(false, Ordering::SeqCst);
        Ok(AuthResponse {
            success: true,
            token: format!("tok-{}", new_id()),
            user: AccountInfo {
                email: email.to_string(),
                name: None,
                provider: "email".to_string(),
            },
        })
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn signup(&self, email: &str, _password: &str, _name: Option<&str>) -> Result<AuthResponse, ClientError> {
        self.auth(email)
    }

    async fn login_email(&self, email: &str, _password: &str) -> Result<AuthResponse, ClientError> {
        self.auth(email)
    }

    async fn login_google(&self, credential: &str) -> Result<AuthResponse, ClientError> {
        self.auth(credential.trim_start_matches("google:"))
    }

    async fn me(&self) -> Result<Option<AccountInfo>, ClientError> {
        self.online()?;
        if self.revoked.load(Ordering::SeqCst) || self.token().is_none() {
            return Ok(None);
        }
        Ok(Some(AccountInfo {
            email: "owner@x.com".to_string(),
            name: None,
            provider: "email".to_string(),
        }))
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.online()
    }

    async fn load(&self) -> Result<Option<UserDocument>, ClientError> {
        self.online()?;
        Ok(self.stored_document())
    }

    async fn save(&self, document: &UserDocument) -> Result<(), ClientError> {
        let delay = *self.save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.online()?;
        self.saves.lock().unwrap().push(document.clone());
        *self.document.lock().unwrap() = Some(document.clone());
        Ok(())
    }

    async fn create_save_point(&self, request: &CreateSavePointRequest) -> Result<SavePointSummary, ClientError> {
        self.online()?;
        let save_point = SavePoint {
            id: new_id(),
            email: "owner@x.com".to_string(),
            device_id: request.device_id.clone(),
            device_name: request.device_name.clone(),
            label: request.label.clone(),
            data: request.data.clone(),
            created_at: self.save_points.lock().unwrap().len() as i64,
        };
        let summary = SavePointSummary::from(&save_point);
        self.save_points.lock().unwrap().push(save_point);
        Ok(summary)
    }

    async fn list_save_points(&self) -> Result<Vec<SavePointSummary>, ClientError> {
        self.online()?;
        let mut list: Vec<SavePointSummary> =
            self.save_points.lock().unwrap().iter().map(SavePointSummary::from).collect();
        list.reverse();
        Ok(list)
    }

    async fn get_save_point(&self, id: &str) -> Result<SavePoint, ClientError> {
        self.online()?;
        self.save_points
            .lock()
            .unwrap()
            .iter()
            .find(|sp| sp.id == id)
            .cloned()
            .ok_or(ClientError::Status { status: 404, message: "not found".to_string() })
    }

    async fn delete_save_point(&self, id: &str) -> Result<(), ClientError> {
        self.online()?;
        self.save_points.lock().unwrap().retain(|sp| sp.id != id);
        Ok(())
    }

    async fn request_rating(&self, body: &RatingRequestBody) -> Result<RatingRequestReceipt, ClientError> {
        self.online()?;
        self.rating_requests.lock().unwrap().push(body.clone());
        Ok(RatingRequestReceipt {
            success: true,
            rating_link: format!("http://localhost:3000/rate/{}", new_id()),
        })
    }
}
