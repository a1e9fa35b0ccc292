use serde::{Deserialize, Serialize};

/// API key for the `/ai/*` routes. Presented as `<key_id>.<secret>`;
/// only a bcrypt hash of the secret is kept.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiKey {
    pub key_id: String,
    pub email: String,
    pub secret_hash: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_used_at: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiKeySummary {
    pub key_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_used_at: Option<i64>,
}

impl From<&ApiKey> for ApiKeySummary {
    fn from(key: &ApiKey) -> Self {
        ApiKeySummary {
            key_id: key.key_id.clone(),
            label: key.label.clone(),
            created_at: key.created_at,
            last_used_at: key.last_used_at,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub label: Option<String>,
}

/// Returned once at creation; the full key is never shown again
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub success: bool,
    pub key: String,
    pub key_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: i64,
}

/// Identity attached to requests authenticated by API key
#[derive(Debug, Clone)]
pub struct ApiKeyOwner {
    pub email: String,
    pub key_id: String,
}
