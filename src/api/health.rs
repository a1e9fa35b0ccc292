use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::config::StoreBackend;
use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
    /// False when the backend runs without storage (data routes answer 503)
    pub store_configured: bool,
    pub store_backend: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_configured = state.store.is_some();
    let store_backend = match (store_configured, state.config.store_backend) {
        (false, _) => "none",
        (true, StoreBackend::Mongo) => "mongo",
        (true, StoreBackend::Memory) => "memory",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if store_configured { "healthy" } else { "degraded" }.to_string(),
        service: "appointment-crm".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        store_configured,
        store_backend: store_backend.to_string(),
    })
}
