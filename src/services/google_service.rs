use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::utils::AppError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity extracted from a verified Google ID token
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
}

#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<GoogleIdentity, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    /// Google returns "true"/"false" as a string
    email_verified: Option<String>,
    name: Option<String>,
}

/// Verifies ID tokens with Google's tokeninfo endpoint.
pub struct GoogleTokenInfoVerifier {
    client_id: Option<String>,
    http: reqwest::Client,
}

impl GoogleTokenInfoVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        GoogleTokenInfoVerifier { client_id, http }
    }
}

#[async_trait]
impl GoogleVerifier for GoogleTokenInfoVerifier {
    async fn verify(&self, credential: &str) -> Result<GoogleIdentity, AppError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("GOOGLE_CLIENT_ID is not set".to_string()))?;

        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google tokeninfo request failed: {}", e)))?;

        if !response.status().is_success() {
            log::warn!("⚠️  Google rejected ID token: HTTP {}", response.status());
            return Err(AppError::Unauthorized("Invalid Google credential".to_string()));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid tokeninfo response: {}", e)))?;

        if info.aud != client_id {
            log::warn!("⚠️  Google token issued for another client: {}", info.aud);
            return Err(AppError::Unauthorized("Google credential audience mismatch".to_string()));
        }

        let email = info
            .email
            .ok_or_else(|| AppError::Unauthorized("Google account has no email".to_string()))?;

        if info.email_verified.as_deref() != Some("true") {
            return Err(AppError::Unauthorized("Google email is not verified".to_string()));
        }

        Ok(GoogleIdentity {
            google_id: info.sub,
            email,
            name: info.name,
        })
    }
}
