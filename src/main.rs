use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use appointment_crm::api;
use appointment_crm::config::{AppConfig, StoreBackend};
use appointment_crm::database::{DocumentStore, MemoryStore, MongoDB};
use appointment_crm::jobs::session_sweeper;
use appointment_crm::middleware::SecurityHeaders;
use appointment_crm::services::{GoogleTokenInfoVerifier, LogMailer, Mailer, SmtpMailer};
use appointment_crm::state::AppState;

async fn build_store(config: &AppConfig) -> Option<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            log::warn!("⚠️  Using in-memory store: data is lost on restart");
            Some(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Mongo => {
            let Some(database_url) = config.database_url.as_deref() else {
                log::warn!("⚠️  DATABASE_URL not set: data routes will answer 503");
                return None;
            };
            match MongoDB::new(database_url).await {
                Ok(db) => {
                    log::info!("✅ MongoDB connected successfully");
                    Some(Arc::new(db))
                }
                Err(e) => {
                    log::error!("❌ Failed to connect to MongoDB: {}", e);
                    log::warn!("⚠️  Continuing without storage: data routes will answer 503");
                    None
                }
            }
        }
    }
}

fn build_mailer(config: &AppConfig) -> Arc<dyn Mailer> {
    match &config.smtp {
        Some(smtp) => match SmtpMailer::new(smtp) {
            Ok(mailer) => {
                log::info!("📧 SMTP mailer ready ({}:{})", smtp.host, smtp.port);
                Arc::new(mailer)
            }
            Err(e) => {
                log::error!("❌ Invalid SMTP configuration: {}", e);
                Arc::new(LogMailer)
            }
        },
        None => {
            log::info!("📧 SMTP_HOST not set, rating emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();

    log::info!("🚀 Starting Appointment CRM...");

    if config.google_client_id.is_none() {
        log::warn!("⚠️  GOOGLE_CLIENT_ID not set: Google sign-in will answer 503");
    }

    let store = build_store(&config).await;
    let mailer = build_mailer(&config);
    let google = Arc::new(GoogleTokenInfoVerifier::new(config.google_client_id.clone()));

    let host = config.host.clone();
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();

    let state = web::Data::new(AppState::new(store, mailer, google, config));

    log::info!("📅 Starting background jobs...");
    session_sweeper::start_session_sweeper(state.clone(), session_sweeper::SWEEP_INTERVAL);
    log::info!("✅ Background jobs started");

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Generate OpenAPI specification
    let openapi = api::swagger::ApiDoc::openapi();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            .configure(api::configure)
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
