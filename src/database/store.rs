//! Data access seam shared by the MongoDB and in-memory backends.
//!
//! Every operation is a single-collection read or write. Callers that touch
//! several collections do so sequentially, without a transaction.

use async_trait::async_trait;

use crate::models::{
    Account, ApiKey, Device, RatingRequest, SavePoint, SavePointSummary, UserDocument,
};
use crate::utils::AppError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // Accounts
    async fn find_account(&self, email: &str) -> Result<Option<Account>, AppError>;
    /// Fails with `Conflict` when the email is taken.
    async fn insert_account(&self, account: &Account) -> Result<(), AppError>;
    async fn update_account(&self, account: &Account) -> Result<(), AppError>;

    // User documents (one per email, replaced wholesale)
    async fn load_document(&self, email: &str) -> Result<Option<UserDocument>, AppError>;
    async fn save_document(&self, email: &str, document: &UserDocument) -> Result<(), AppError>;

    // Devices and save points
    async fn upsert_device(&self, device: &Device) -> Result<(), AppError>;
    async fn insert_save_point(&self, save_point: &SavePoint) -> Result<(), AppError>;
    /// Newest first, without snapshot data.
    async fn list_save_points(&self, email: &str) -> Result<Vec<SavePointSummary>, AppError>;
    async fn find_save_point(&self, email: &str, id: &str) -> Result<Option<SavePoint>, AppError>;
    async fn delete_save_point(&self, email: &str, id: &str) -> Result<bool, AppError>;

    // API keys
    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), AppError>;
    async fn find_api_key(&self, key_id: &str) -> Result<Option<ApiKey>, AppError>;
    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKey>, AppError>;
    async fn delete_api_key(&self, email: &str, key_id: &str) -> Result<bool, AppError>;
    async fn touch_api_key(&self, key_id: &str, at: i64) -> Result<(), AppError>;

    // Rating requests
    async fn insert_rating_request(&self, request: &RatingRequest) -> Result<(), AppError>;
    async fn find_rating_request(&self, token: &str) -> Result<Option<RatingRequest>, AppError>;
    /// Returns false when the request was already used.
    async fn mark_rating_request_used(&self, token: &str, at: i64) -> Result<bool, AppError>;
}
