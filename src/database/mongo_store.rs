use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::error::{ErrorKind, WriteFailure};
use serde::{Deserialize, Serialize};

use super::{
    DocumentStore, MongoDB, ACCOUNTS, API_KEYS, DEVICES, RATING_REQUESTS, SAVE_POINTS,
    USER_DOCUMENTS,
};
use crate::models::{
    Account, ApiKey, Device, RatingRequest, SavePoint, SavePointSummary, UserDocument,
};
use crate::utils::{now_millis, AppError};

/// Row of the "user_documents" collection
#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    email: String,
    document: UserDocument,
    updated_at: i64,
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

#[async_trait]
impl DocumentStore for MongoDB {
    async fn find_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .collection::<Account>(ACCOUNTS)
            .find_one(doc! { "email": email })
            .await?)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        match self.collection::<Account>(ACCOUNTS).insert_one(account).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict("An account with this email already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_account(&self, account: &Account) -> Result<(), AppError> {
        self.collection::<Account>(ACCOUNTS)
            .replace_one(doc! { "email": &account.email }, account)
            .await?;
        Ok(())
    }

    async fn load_document(&self, email: &str) -> Result<Option<UserDocument>, AppError> {
        let stored = self
            .collection::<StoredDocument>(USER_DOCUMENTS)
            .find_one(doc! { "email": email })
            .await?;
        Ok(stored.map(|s| s.document))
    }

    async fn save_document(&self, email: &str, document: &UserDocument) -> Result<(), AppError> {
        let stored = StoredDocument {
            email: email.to_string(),
            document: document.clone(),
            updated_at: now_millis(),
        };
        self.collection::<StoredDocument>(USER_DOCUMENTS)
            .replace_one(doc! { "email": email }, &stored)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn upsert_device(&self, device: &Device) -> Result<(), AppError> {
        let update = doc! {
            "$set": {
                "device_name": device.device_name.clone(),
                "last_seen": device.last_seen,
            },
            "$setOnInsert": {
                "first_seen": device.first_seen,
            }
        };
        self.collection::<Device>(DEVICES)
            .update_one(doc! { "email": &device.email, "device_id": &device.device_id }, update)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn insert_save_point(&self, save_point: &SavePoint) -> Result<(), AppError> {
        self.collection::<SavePoint>(SAVE_POINTS).insert_one(save_point).await?;
        Ok(())
    }

    async fn list_save_points(&self, email: &str) -> Result<Vec<SavePointSummary>, AppError> {
        let cursor = self
            .collection::<SavePointSummary>(SAVE_POINTS)
            .find(doc! { "email": email })
            .projection(doc! { "data": 0 })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_save_point(&self, email: &str, id: &str) -> Result<Option<SavePoint>, AppError> {
        Ok(self
            .collection::<SavePoint>(SAVE_POINTS)
            .find_one(doc! { "email": email, "id": id })
            .await?)
    }

    async fn delete_save_point(&self, email: &str, id: &str) -> Result<bool, AppError> {
        let result = self
            .collection::<SavePoint>(SAVE_POINTS)
            .delete_one(doc! { "email": email, "id": id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), AppError> {
        self.collection::<ApiKey>(API_KEYS).insert_one(key).await?;
        Ok(())
    }

    async fn find_api_key(&self, key_id: &str) -> Result<Option<ApiKey>, AppError> {
        Ok(self
            .collection::<ApiKey>(API_KEYS)
            .find_one(doc! { "key_id": key_id })
            .await?)
    }

    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKey>, AppError> {
        let cursor = self
            .collection::<ApiKey>(API_KEYS)
            .find(doc! { "email": email })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_api_key(&self, email: &str, key_id: &str) -> Result<bool, AppError> {
        let result = self
            .collection::<ApiKey>(API_KEYS)
            .delete_one(doc! { "email": email, "key_id": key_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn touch_api_key(&self, key_id: &str, at: i64) -> Result<(), AppError> {
        self.collection::<ApiKey>(API_KEYS)
            .update_one(doc! { "key_id": key_id }, doc! { "$set": { "last_used_at": at } })
            .await?;
        Ok(())
    }

    async fn insert_rating_request(&self, request: &RatingRequest) -> Result<(), AppError> {
        self.collection::<RatingRequest>(RATING_REQUESTS).insert_one(request).await?;
        Ok(())
    }

    async fn find_rating_request(&self, token: &str) -> Result<Option<RatingRequest>, AppError> {
        Ok(self
            .collection::<RatingRequest>(RATING_REQUESTS)
            .find_one(doc! { "token": token })
            .await?)
    }

    async fn mark_rating_request_used(&self, token: &str, at: i64) -> Result<bool, AppError> {
        let result = self
            .collection::<RatingRequest>(RATING_REQUESTS)
            .update_one(
                doc! { "token": token, "used_at": Bson::Null },
                doc! { "$set": { "used_at": at } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}
