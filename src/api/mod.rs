pub mod ai;
pub mod auth;
pub mod documents;
pub mod health;
pub mod keys;
pub mod metrics;
pub mod notifications;
pub mod ratings;
pub mod savepoints;
pub mod swagger;

use actix_web::{web, ResponseError};

use crate::middleware::{ApiKeyMiddleware, AuthMiddleware};
use crate::utils::AppError;

/// Documents are sent whole, so the default 32 KiB JSON limit is too small.
const JSON_LIMIT: usize = 4 * 1024 * 1024;

/// Every route of the service. Shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let message = err.to_string();
            actix_web::error::InternalError::from_response(
                err,
                AppError::InvalidRequest(message).error_response(),
            )
            .into()
        });

    cfg.app_data(json_config)
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))
        .service(
            web::scope("/api/v1")
                // Auth endpoints
                .service(
                    web::scope("/auth")
                        .route("/google", web::post().to(auth::google_login))
                        .route("/signup", web::post().to(auth::signup))
                        .route("/email", web::post().to(auth::email_login)),
                )
                .route("/me", web::get().to(auth::me))
                .route("/logout", web::post().to(auth::logout))
                // Document load/save
                .service(
                    web::resource("/load")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(documents::load)),
                )
                .service(
                    web::resource("/save")
                        .wrap(AuthMiddleware)
                        .route(web::post().to(documents::save)),
                )
                // Save points
                .service(
                    web::scope("/savepoints")
                        .wrap(AuthMiddleware)
                        .route("", web::post().to(savepoints::create_save_point))
                        .route("", web::get().to(savepoints::list_save_points))
                        .route("/{id}", web::get().to(savepoints::get_save_point))
                        .route("/{id}", web::delete().to(savepoints::delete_save_point)),
                )
                // Rating emails
                .service(
                    web::scope("/notifications")
                        .wrap(AuthMiddleware)
                        .route("/rating-request", web::post().to(notifications::rating_request)),
                )
                // API key management (session auth)
                .service(
                    web::scope("/keys")
                        .wrap(AuthMiddleware)
                        .route("", web::post().to(keys::create_key))
                        .route("", web::get().to(keys::list_keys))
                        .route("/{id}", web::delete().to(keys::delete_key)),
                )
                // AI agents (API key auth)
                .service(
                    web::scope("/ai")
                        .wrap(ApiKeyMiddleware)
                        .route("/stats", web::get().to(ai::get_stats))
                        .route("/clients", web::get().to(ai::list_clients))
                        .route("/clients", web::post().to(ai::add_client))
                        .route("/appointments", web::get().to(ai::list_appointments))
                        .route("/appointments", web::post().to(ai::book_appointment))
                        .route("/appointments/{id}", web::patch().to(ai::update_appointment)),
                )
                // Public rating page
                .service(
                    web::scope("/public/ratings")
                        .route("/{token}", web::get().to(ratings::describe_rating))
                        .route("/{token}", web::post().to(ratings::submit_rating)),
                ),
        );
}

#[cfg(test)]
mod tests;
