use actix_web::{web, HttpResponse, ResponseError};

use crate::middleware::SessionUser;
use crate::models::CreateApiKeyRequest;
use crate::services::api_key_service;
use crate::state::AppState;

/// POST /api/v1/keys - the full key is only returned here
pub async fn create_key(
    user: web::ReqData<SessionUser>,
    state: web::Data<AppState>,
    request: web::Json<CreateApiKeyRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /keys - {}", user.email);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match api_key_service::create(store, state.config.bcrypt_cost, &user.email, request.into_inner().label).await {
        Ok(created) => HttpResponse::Created().json(created),
        Err(e) => {
            log::error!("❌ Error creating API key: {}", e);
            e.error_response()
        }
    }
}

/// GET /api/v1/keys
pub async fn list_keys(user: web::ReqData<SessionUser>, state: web::Data<AppState>) -> HttpResponse {
    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match api_key_service::list(store, &user.email).await {
        Ok(keys) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "count": keys.len(),
            "keys": keys
        })),
        Err(e) => e.error_response(),
    }
}

/// DELETE /api/v1/keys/{id}
pub async fn delete_key(
    user: web::ReqData<SessionUser>,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let key_id = path.into_inner();
    log::info!("🗑️  DELETE /keys/{} - {}", key_id, user.email);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match api_key_service::revoke(store, &user.email, &key_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "API key revoked"
        })),
        Err(e) => e.error_response(),
    }
}
