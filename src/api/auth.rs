use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::api::metrics;
use crate::middleware::auth::{resolve_session, session_token, SESSION_COOKIE};
use crate::services::auth_service::{
    self, AuthResponse, GoogleLoginRequest, LoginRequest, MeResponse, SignupRequest,
};
use crate::state::AppState;
use crate::utils::AppError;

fn session_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies)
        .max_age(CookieDuration::hours(state.sessions.ttl_hours()))
        .finish()
}

fn authenticated(state: &AppState, response: AuthResponse) -> HttpResponse {
    metrics::increment_login_count();
    HttpResponse::Ok()
        .cookie(session_cookie(state, &response.token))
        .json(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/google",
    tag = "Auth",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Signed in with Google", body = AuthResponse),
        (status = 401, description = "Invalid Google credential"),
        (status = 503, description = "Google sign-in or storage not configured")
    )
)]
pub async fn google_login(
    state: web::Data<AppState>,
    request: web::Json<GoogleLoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/google");

    match auth_service::login_google(&state, &request).await {
        Ok(response) => {
            log::info!("✅ Google login: {}", response.user.email);
            authenticated(&state, response)
        }
        Err(e) => {
            log::warn!("❌ Google login failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created and signed in", body = AuthResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    state: web::Data<AppState>,
    request: web::Json<SignupRequest>,
) -> HttpResponse {
    log::info!("📝 POST /auth/signup - email: {}", request.email);

    match auth_service::signup(&state, &request).await {
        Ok(response) => authenticated(&state, response),
        Err(e) => {
            log::warn!("❌ Signup failed for {}: {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/email",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn email_login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/email - email: {}", request.email);

    match auth_service::login_email(&state, &request).await {
        Ok(response) => authenticated(&state, response),
        Err(e) => {
            log::warn!("❌ Login failed for {}: {}", request.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current account", body = MeResponse),
        (status = 401, description = "No valid session", body = MeResponse)
    ),
    security(
        ("session" = [])
    )
)]
pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let unauthenticated = || {
        HttpResponse::Unauthorized().json(MeResponse {
            success: false,
            authenticated: false,
            user: None,
        })
    };

    let Some(session) = resolve_session(&req, &state) else {
        return unauthenticated();
    };

    match auth_service::me(&state, &session.email).await {
        Ok(user) => HttpResponse::Ok().json(MeResponse {
            success: true,
            authenticated: true,
            user: Some(user),
        }),
        Err(AppError::Unauthorized(_)) => unauthenticated(),
        Err(e) => {
            log::error!("❌ Error loading account {}: {}", session.email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Session cleared (also when there was none)")
    )
)]
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let token = session_token(&req);
    let revoked = auth_service::logout(&state, token.as_deref());
    log::info!("👋 POST /logout - session revoked: {}", revoked);

    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();

    HttpResponse::Ok().cookie(removal).json(serde_json::json!({
        "success": true,
        "message": "Logged out"
    }))
}
