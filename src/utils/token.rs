use base64::Engine;
use uuid::Uuid;

/// Opaque 256-bit token, URL-safe base64 without padding.
pub fn generate_token() -> String {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Short random identifier used for records (clients, appointments, save points...).
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
