use std::fmt;

use crate::models::DomainError;

#[derive(Debug)]
pub enum ClientError {
    /// Backend unreachable, timed out or returned an unreadable response
    Network(String),
    Unauthorized(String),
    Status { status: u16, message: String },
    Storage(String),
    Decode(String),
    Domain(DomainError),
    /// The document has not been loaded yet
    NotLoaded,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ClientError::Status { status, message } => write!(f, "HTTP {}: {}", status, message),
            ClientError::Storage(msg) => write!(f, "Local storage error: {}", msg),
            ClientError::Decode(msg) => write!(f, "Invalid data: {}", msg),
            ClientError::Domain(e) => write!(f, "{}", e),
            ClientError::NotLoaded => write!(f, "Data is not loaded yet"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

impl From<DomainError> for ClientError {
    fn from(e: DomainError) -> Self {
        ClientError::Domain(e)
    }
}
