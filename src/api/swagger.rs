use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Appointment CRM API",
        version = "1.0.0",
        description = "Backend for a small-business scheduling and CRM app.\n\n**Authentication:** account routes use the `session` cookie or `Authorization: Bearer <session token>`. The `/ai/*` routes use `Authorization: Bearer <key_id>.<secret>` API keys.\n\n**Features:**\n- Email/password and Google sign-in\n- Per-account document load/save\n- Device-labelled save points\n- Rating requests by email"
    ),
    paths(
        // Auth
        crate::api::auth::google_login,
        crate::api::auth::signup,
        crate::api::auth::email_login,
        crate::api::auth::me,
        crate::api::auth::logout,

        // Documents
        crate::api::documents::load,
        crate::api::documents::save,

        // Save points
        crate::api::savepoints::create_save_point,
        crate::api::savepoints::list_save_points,
        crate::api::savepoints::get_save_point,
        crate::api::savepoints::delete_save_point,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::GoogleLoginRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::MeResponse,
            crate::models::AccountInfo,
            crate::models::UserDocument,
            crate::models::SavePoint,
            crate::models::SavePointSummary,
            crate::models::CreateSavePointRequest,
            crate::api::documents::LoadResponse,
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Sign-up, sign-in (email or Google), current account and logout."),
        (name = "Documents", description = "Load and save the account's whole business document."),
        (name = "Save points", description = "Manual snapshots of the document, labelled with the creating device."),
        (name = "Health", description = "Health check and metrics."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("opaque")
                        .description(Some("Session token from /auth/*, or the session cookie"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("key_id.secret")
                        .description(Some("API key created with POST /api/v1/keys"))
                        .build(),
                ),
            );
        }
    }
}
