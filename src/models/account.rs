use serde::{Deserialize, Serialize};

/// Account record in the "accounts" collection, keyed by email
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Account {
    pub email: String,
    /// bcrypt hash; None for Google-only accounts
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub google_id: Option<String>,
    pub provider: String, // "email" or "google"
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_login: Option<i64>,
}

/// Public view of an account (never carries the password hash)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct AccountInfo {
    pub email: String,
    pub name: Option<String>,
    pub provider: String,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        AccountInfo {
            email: account.email.clone(),
            name: account.name.clone(),
            provider: account.provider.clone(),
        }
    }
}
