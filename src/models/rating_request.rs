use serde::{Deserialize, Serialize};

/// Pending invitation for a client to rate an appointment ("rating_requests" collection)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RatingRequest {
    pub token: String,
    /// Owner of the UserDocument the rating lands in
    pub email: String,
    pub appointment_id: String,
    pub business_name: String,
    pub client_name: String,
    pub client_email: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub used_at: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RatingRequestBody {
    pub appointment_id: String,
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub business_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingRequestReceipt {
    pub success: bool,
    pub rating_link: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicRatingInfo {
    pub success: bool,
    pub business_name: String,
    pub client_name: String,
    pub already_rated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRatingRequest {
    pub score: i32,
    #[serde(default)]
    pub comment: Option<String>,
}
