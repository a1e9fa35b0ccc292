use actix_web::{web, HttpResponse, ResponseError};
use serde::Serialize;

use crate::api::metrics;
use crate::middleware::SessionUser;
use crate::models::UserDocument;
use crate::services::document_service;
use crate::state::AppState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoadResponse {
    pub success: bool,
    /// null when the account has never saved
    pub data: Option<UserDocument>,
}

#[utoipa::path(
    get,
    path = "/api/v1/load",
    tag = "Documents",
    responses(
        (status = 200, description = "The account's document", body = LoadResponse),
        (status = 401, description = "No valid session"),
        (status = 503, description = "Storage not configured")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn load(user: web::ReqData<SessionUser>, state: web::Data<AppState>) -> HttpResponse {
    log::info!("📥 GET /load - {}", user.email);

    let result = match state.store() {
        Ok(store) => document_service::load(store, &user.email).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(data) => HttpResponse::Ok().json(LoadResponse { success: true, data }),
        Err(e) => {
            log::error!("❌ Error loading document for {}: {}", user.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/save",
    tag = "Documents",
    request_body = UserDocument,
    responses(
        (status = 200, description = "Document replaced"),
        (status = 401, description = "No valid session"),
        (status = 503, description = "Storage not configured")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn save(
    user: web::ReqData<SessionUser>,
    state: web::Data<AppState>,
    document: web::Json<UserDocument>,
) -> HttpResponse {
    log::info!("💾 POST /save - {}", user.email);

    let result = match state.store() {
        Ok(store) => document_service::save(store, &user.email, &document).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            metrics::increment_save_count();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Document saved"
            }))
        }
        Err(e) => {
            log::error!("❌ Error saving document for {}: {}", user.email, e);
            e.error_response()
        }
    }
}
