use actix_web::{web, HttpResponse, ResponseError};

use crate::middleware::SessionUser;
use crate::models::{CreateSavePointRequest, SavePoint, SavePointSummary};
use crate::services::savepoint_service;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/savepoints",
    tag = "Save points",
    request_body = CreateSavePointRequest,
    responses(
        (status = 201, description = "Snapshot stored", body = SavePointSummary),
        (status = 400, description = "Missing device id or data")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn create_save_point(
    user: web::ReqData<SessionUser>,
    state: web::Data<AppState>,
    request: web::Json<CreateSavePointRequest>,
) -> HttpResponse {
    log::info!("📸 POST /savepoints - {} (device {})", user.email, request.device_id);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match savepoint_service::create(store, &user.email, request.into_inner()).await {
        Ok(save_point) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "save_point": SavePointSummary::from(&save_point)
        })),
        Err(e) => {
            log::error!("❌ Error creating save point: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/savepoints",
    tag = "Save points",
    responses(
        (status = 200, description = "Save points, newest first", body = [SavePointSummary])
    ),
    security(
        ("session" = [])
    )
)]
pub async fn list_save_points(user: web::ReqData<SessionUser>, state: web::Data<AppState>) -> HttpResponse {
    log::info!("📋 GET /savepoints - {}", user.email);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match savepoint_service::list(store, &user.email).await {
        Ok(save_points) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "count": save_points.len(),
            "save_points": save_points
        })),
        Err(e) => {
            log::error!("❌ Error listing save points: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/savepoints/{id}",
    tag = "Save points",
    params(
        ("id" = String, Path, description = "Save point id")
    ),
    responses(
        (status = 200, description = "Full snapshot", body = SavePoint),
        (status = 404, description = "Unknown save point")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn get_save_point(
    user: web::ReqData<SessionUser>,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🔍 GET /savepoints/{} - {}", id, user.email);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match savepoint_service::get(store, &user.email, &id).await {
        Ok(save_point) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "save_point": save_point
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/savepoints/{id}",
    tag = "Save points",
    params(
        ("id" = String, Path, description = "Save point id")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Unknown save point")
    ),
    security(
        ("session" = [])
    )
)]
pub async fn delete_save_point(
    user: web::ReqData<SessionUser>,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /savepoints/{} - {}", id, user.email);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match savepoint_service::delete(store, &user.email, &id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Save point deleted"
        })),
        Err(e) => e.error_response(),
    }
}
