use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    /// Process-local store, lost on restart. For local development.
    Memory,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub tls: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub store_backend: StoreBackend,
    pub session_ttl_hours: i64,
    /// Base URL used in emailed rating links
    pub public_url: String,
    pub allowed_origins: Vec<String>,
    pub google_client_id: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub bcrypt_cost: u32,
    pub secure_cookies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3002,
            database_url: None,
            store_backend: StoreBackend::Mongo,
            session_ttl_hours: 24 * 7,
            public_url: "http://localhost:3000".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            google_client_id: None,
            smtp: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            secure_cookies: false,
        }
    }
}

/// Longest session lifetime accepted, one year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Out-of-range values are clamped; unparsable ones fall back to `default`.
fn parse_session_ttl(raw: Option<String>, default: i64) -> i64 {
    match raw.and_then(|h| h.parse::<i64>().ok()) {
        Some(hours) if (1..=MAX_SESSION_TTL_HOURS).contains(&hours) => hours,
        Some(hours) => {
            let clamped = hours.clamp(1, MAX_SESSION_TTL_HOURS);
            log::warn!("⚠️  SESSION_TTL_HOURS={} out of range, using {}", hours, clamped);
            clamped
        }
        None => default,
    }
}

pub(crate) fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Reads configuration from the environment (call `dotenv()` first).
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        let store_backend = match var("STORE_BACKEND").as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("mongo") | None => StoreBackend::Mongo,
            Some(other) => {
                log::warn!("⚠️  Unknown STORE_BACKEND '{}', using mongo", other);
                StoreBackend::Mongo
            }
        };

        let smtp = var("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: var("SMTP_PORT").and_then(|p| p.parse().ok()).unwrap_or(587),
            username: var("SMTP_USERNAME"),
            password: var("SMTP_PASSWORD"),
            from: var("SMTP_FROM").unwrap_or_else(|| "Bookings <no-reply@localhost>".to_string()),
            tls: var("SMTP_TLS").map(|v| v != "false").unwrap_or(true),
        });

        AppConfig {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
            database_url: var("DATABASE_URL"),
            store_backend,
            session_ttl_hours: parse_session_ttl(var("SESSION_TTL_HOURS"), defaults.session_ttl_hours),
            public_url: var("PUBLIC_URL").unwrap_or(defaults.public_url),
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            smtp,
            bcrypt_cost: var("BCRYPT_COST")
                .and_then(|c| c.parse().ok())
                .unwrap_or(defaults.bcrypt_cost),
            secure_cookies: var("SECURE_COOKIES").map(|v| v == "true").unwrap_or(false),
        }
    }
}
