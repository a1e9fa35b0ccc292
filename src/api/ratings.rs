use actix_web::{web, HttpResponse, ResponseError};

use crate::models::SubmitRatingRequest;
use crate::services::rating_service;
use crate::state::AppState;

/// GET /api/v1/public/ratings/{token} - what the rating page shows
pub async fn describe_rating(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match rating_service::describe(store, &path).await {
        Ok(info) => HttpResponse::Ok().json(info),
        Err(e) => e.error_response(),
    }
}

/// POST /api/v1/public/ratings/{token}
pub async fn submit_rating(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SubmitRatingRequest>,
) -> HttpResponse {
    log::info!("⭐ POST /public/ratings - score {}", body.score);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match rating_service::submit(store, &path, body.into_inner()).await {
        Ok(rating) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "rating": rating
        })),
        Err(e) => {
            log::warn!("⚠️  Rating submission rejected: {}", e);
            e.error_response()
        }
    }
}
