use serde::{Deserialize, Serialize};

/// Full snapshot of a UserDocument ("save_points" collection)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct SavePoint {
    pub id: String,
    pub email: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,
    /// Snapshot JSON, stored exactly as received
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub created_at: i64,
}

/// Save point without its snapshot, for listings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct SavePointSummary {
    pub id: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,
    pub created_at: i64,
}

impl From<&SavePoint> for SavePointSummary {
    fn from(save_point: &SavePoint) -> Self {
        SavePointSummary {
            id: save_point.id.clone(),
            device_id: save_point.device_id.clone(),
            device_name: save_point.device_name.clone(),
            label: save_point.label.clone(),
            created_at: save_point.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct CreateSavePointRequest {
    /// Device fingerprint generated by the client
    pub device_id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// Devices known per account ("devices" collection)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Device {
    pub email: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub device_name: Option<String>,
    pub first_seen: i64,
    pub last_seen: i64,
}
