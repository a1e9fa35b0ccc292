use actix_web::{web, HttpResponse, ResponseError};

use crate::middleware::SessionUser;
use crate::models::RatingRequestBody;
use crate::services::notification_service;
use crate::state::AppState;

/// POST /api/v1/notifications/rating-request - emails a one-time rating link
pub async fn rating_request(
    user: web::ReqData<SessionUser>,
    state: web::Data<AppState>,
    body: web::Json<RatingRequestBody>,
) -> HttpResponse {
    log::info!(
        "⭐ POST /notifications/rating-request - {} for appointment {}",
        user.email,
        body.appointment_id
    );

    match notification_service::request_rating(&state, &user.email, body.into_inner()).await {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(e) => e.error_response(),
    }
}
