// ==================== AI AGENT API ====================
// API-key authenticated access to the key owner's document, for external agents

use actix_web::{web, HttpResponse, ResponseError};

use crate::models::{ApiKeyOwner, BookingRequest, NewClient};
use crate::services::ai_service::{self, AppointmentQuery, ClientQuery, StatusUpdateRequest};
use crate::state::AppState;

/// GET /api/v1/ai/stats
pub async fn get_stats(owner: web::ReqData<ApiKeyOwner>, state: web::Data<AppState>) -> HttpResponse {
    log::info!("🤖 GET /ai/stats - {}", owner.email);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match ai_service::stats(store, &owner.email).await {
        Ok(stats) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "stats": stats
        })),
        Err(e) => e.error_response(),
    }
}

/// GET /api/v1/ai/clients?search=
pub async fn list_clients(
    owner: web::ReqData<ApiKeyOwner>,
    state: web::Data<AppState>,
    query: web::Query<ClientQuery>,
) -> HttpResponse {
    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match ai_service::list_clients(store, &owner.email, &query).await {
        Ok(clients) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "count": clients.len(),
            "clients": clients
        })),
        Err(e) => e.error_response(),
    }
}

/// POST /api/v1/ai/clients
pub async fn add_client(
    owner: web::ReqData<ApiKeyOwner>,
    state: web::Data<AppState>,
    body: web::Json<NewClient>,
) -> HttpResponse {
    log::info!("🤖 POST /ai/clients - {} adds '{}'", owner.email, body.name);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match ai_service::add_client(store, &owner.email, body.into_inner()).await {
        Ok(client) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "client": client
        })),
        Err(e) => e.error_response(),
    }
}

/// GET /api/v1/ai/appointments?date=&status=
pub async fn list_appointments(
    owner: web::ReqData<ApiKeyOwner>,
    state: web::Data<AppState>,
    query: web::Query<AppointmentQuery>,
) -> HttpResponse {
    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match ai_service::list_appointments(store, &owner.email, &query).await {
        Ok(appointments) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "count": appointments.len(),
            "appointments": appointments
        })),
        Err(e) => e.error_response(),
    }
}

/// POST /api/v1/ai/appointments
pub async fn book_appointment(
    owner: web::ReqData<ApiKeyOwner>,
    state: web::Data<AppState>,
    body: web::Json<BookingRequest>,
) -> HttpResponse {
    log::info!("🤖 POST /ai/appointments - {} on {} {}", owner.email, body.date, body.time);

    let store = match state.store() {
        Ok(store) => store,
        Err(e) => return e.error_response(),
    };

    match ai_service::book_appointment(store, &owner.email, body.into_inner()).await {
        Ok(booking) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "appointment": booking.appointment,
            "created_client": booking.created_client
        })),
        Err(e) => e.error_response(),
    }
}

/// PATCH /api/v1/ai/appointments/{id}
pub async fn update_appointment(
    owner: web::ReqData<ApiKeyOwner>,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🤖 PATCH /ai/appointments/{} - {} -> {}", id, owner.email, body.status);

    match ai_service::update_status(&state, &owner.email, &id, body.status).await {
        Ok(update) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "appointment": update.appointment,
            "rating_request_sent": update.rating_request_sent
        })),
        Err(e) => e.error_response(),
    }
}
