use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::sync::RwLock;
use std::time::Duration;

use super::error::ClientError;
use crate::models::{
    AccountInfo, CreateSavePointRequest, RatingRequestBody, RatingRequestReceipt, SavePoint,
    SavePointSummary, UserDocument,
};
use crate::services::auth_service::{AuthResponse, MeResponse};

/// The backend as seen by the client. `ApiClient` talks HTTP; tests plug
/// in an in-process fake.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Token sent as `Authorization: Bearer` on later calls
    fn set_token(&self, token: Option<String>);

    async fn signup(&self, email: &str, password: &str, name: Option<&str>) -> Result<AuthResponse, ClientError>;
    async fn login_email(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError>;
    async fn login_google(&self, credential: &str) -> Result<AuthResponse, ClientError>;
    /// None when the current token is not (or no longer) valid
    async fn me(&self) -> Result<Option<AccountInfo>, ClientError>;
    async fn logout(&self) -> Result<(), ClientError>;

    async fn load(&self) -> Result<Option<UserDocument>, ClientError>;
    async fn save(&self, document: &UserDocument) -> Result<(), ClientError>;

    async fn create_save_point(&self, request: &CreateSavePointRequest) -> Result<SavePointSummary, ClientError>;
    async fn list_save_points(&self) -> Result<Vec<SavePointSummary>, ClientError>;
    async fn get_save_point(&self, id: &str) -> Result<SavePoint, ClientError>;
    async fn delete_save_point(&self, id: &str) -> Result<(), ClientError>;

    async fn request_rating(&self, body: &RatingRequestBody) -> Result<RatingRequestReceipt, ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Debug, Deserialize)]
struct LoadEnvelope {
    data: Option<UserDocument>,
}

#[derive(Debug, Deserialize)]
struct SavePointEnvelope<T> {
    save_point: T,
}

#[derive(Debug, Deserialize)]
struct SavePointList {
    save_points: Vec<SavePointSummary>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:3002`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        let token = self.token.read().ok().and_then(|t| t.clone());
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error,
            Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
        };

        if status == StatusCode::UNAUTHORIZED {
            Err(ClientError::Unauthorized(message))
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl Backend for ApiClient {
    fn set_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.token.write() {
            *current = token;
        }
    }

    async fn signup(&self, email: &str, password: &str, name: Option<&str>) -> Result<AuthResponse, ClientError> {
        let body = json!({ "email": email, "password": password, "name": name });
        self.send(self.request(Method::POST, "/auth/signup").json(&body)).await
    }

    async fn login_email(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = json!({ "email": email, "password": password });
        self.send(self.request(Method::POST, "/auth/email").json(&body)).await
    }

    async fn login_google(&self, credential: &str) -> Result<AuthResponse, ClientError> {
        let body = json!({ "credential": credential });
        self.send(self.request(Method::POST, "/auth/google").json(&body)).await
    }

    async fn me(&self) -> Result<Option<AccountInfo>, ClientError> {
        match self.send::<MeResponse>(self.request(Method::GET, "/me")).await {
            Ok(me) => {
                let authenticated = me.authenticated;
                Ok(me.user.filter(|_| authenticated))
            }
            Err(ClientError::Unauthorized(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(self.request(Method::POST, "/logout")).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<UserDocument>, ClientError> {
        let envelope: LoadEnvelope = self.send(self.request(Method::GET, "/load")).await?;
        Ok(envelope.data)
    }

    async fn save(&self, document: &UserDocument) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(self.request(Method::POST, "/save").json(document))
            .await?;
        Ok(())
    }

    async fn create_save_point(&self, request: &CreateSavePointRequest) -> Result<SavePointSummary, ClientError> {
        let envelope: SavePointEnvelope<SavePointSummary> = self
            .send(self.request(Method::POST, "/savepoints").json(request))
            .await?;
        Ok(envelope.save_point)
    }

    async fn list_save_points(&self) -> Result<Vec<SavePointSummary>, ClientError> {
        let list: SavePointList = self.send(self.request(Method::GET, "/savepoints")).await?;
        Ok(list.save_points)
    }

    async fn get_save_point(&self, id: &str) -> Result<SavePoint, ClientError> {
        let path = format!("/savepoints/{}", urlencoding::encode(id));
        let envelope: SavePointEnvelope<SavePoint> = self.send(self.request(Method::GET, &path)).await?;
        Ok(envelope.save_point)
    }

    async fn delete_save_point(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/savepoints/{}", urlencoding::encode(id));
        self.send::<serde_json::Value>(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn request_rating(&self, body: &RatingRequestBody) -> Result<RatingRequestReceipt, ClientError> {
        self.send(self.request(Method::POST, "/notifications/rating-request").json(body))
            .await
    }
}
