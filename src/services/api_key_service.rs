use bcrypt::{hash, verify};

use crate::database::DocumentStore;
use crate::models::{ApiKey, ApiKeyOwner, ApiKeySummary, CreatedApiKey};
use crate::utils::{generate_token, new_id, now_millis, AppError};

/// Issues a key for `email`. The returned `key` is the only time the
/// secret is visible.
pub async fn create(
    store: &dyn DocumentStore,
    bcrypt_cost: u32,
    email: &str,
    label: Option<String>,
) -> Result<CreatedApiKey, AppError> {
    let key_id = new_id();
    let secret = generate_token();

    let key = ApiKey {
        key_id: key_id.clone(),
        email: email.to_string(),
        secret_hash: hash(&secret, bcrypt_cost)?,
        label: label.filter(|l| !l.trim().is_empty()),
        created_at: now_millis(),
        last_used_at: None,
    };
    store.insert_api_key(&key).await?;

    log::info!("🔑 API key {} created for {}", key_id, email);

    Ok(CreatedApiKey {
        success: true,
        key: format!("{}.{}", key_id, secret),
        key_id,
        label: key.label,
        created_at: key.created_at,
    })
}

pub async fn list(store: &dyn DocumentStore, email: &str) -> Result<Vec<ApiKeySummary>, AppError> {
    let keys = store.list_api_keys(email).await?;
    Ok(keys.iter().map(ApiKeySummary::from).collect())
}

pub async fn revoke(store: &dyn DocumentStore, email: &str, key_id: &str) -> Result<(), AppError> {
    if store.delete_api_key(email, key_id).await? {
        log::info!("🗑️  API key {} revoked", key_id);
        Ok(())
    } else {
        Err(AppError::NotFound(format!("API key {} not found", key_id)))
    }
}

/// Resolves a presented `<key_id>.<secret>` to its owner.
pub async fn authenticate(store: &dyn DocumentStore, presented: &str) -> Result<ApiKeyOwner, AppError> {
    let invalid = || AppError::Unauthorized("Invalid API key".to_string());

    let (key_id, secret) = presented.trim().split_once('.').ok_or_else(invalid)?;
    if key_id.is_empty() || secret.is_empty() {
        return Err(invalid());
    }

    let key = store.find_api_key(key_id).await?.ok_or_else(invalid)?;
    if !verify(secret, &key.secret_hash)? {
        return Err(invalid());
    }

    if let Err(e) = store.touch_api_key(key_id, now_millis()).await {
        log::warn!("⚠️  Failed to update last use of API key {}: {}", key_id, e);
    }

    Ok(ApiKeyOwner {
        email: key.email,
        key_id: key.key_id,
    })
}
