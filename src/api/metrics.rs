use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::AppState;

static LOGIN_COUNT: AtomicU64 = AtomicU64::new(0);
static SAVE_COUNT: AtomicU64 = AtomicU64::new(0);
static RATING_EMAIL_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn increment_login_count() {
    LOGIN_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_save_count() {
    SAVE_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_rating_email_count() {
    RATING_EMAIL_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub logins_total: u64,
    pub document_saves_total: u64,
    pub rating_emails_total: u64,
    pub active_sessions: u64,
}

impl MetricsResponse {
    fn collect(state: &AppState) -> Self {
        MetricsResponse {
            logins_total: LOGIN_COUNT.load(Ordering::Relaxed),
            document_saves_total: SAVE_COUNT.load(Ordering::Relaxed),
            rating_emails_total: RATING_EMAIL_COUNT.load(Ordering::Relaxed),
            active_sessions: state.sessions.len() as u64,
        }
    }

    /// Prometheus text exposition format
    fn render(&self) -> String {
        let series = [
            ("logins_total", "counter", "Successful sign-ins and sign-ups", self.logins_total),
            ("document_saves_total", "counter", "Documents saved through /save", self.document_saves_total),
            ("rating_emails_total", "counter", "Rating request emails sent", self.rating_emails_total),
            ("active_sessions", "gauge", "Sessions currently held in memory", self.active_sessions),
        ];

        let mut out = String::new();
        for (name, kind, help, value) in series {
            let _ = writeln!(out, "# HELP {} {}\n# TYPE {} {}\n{} {}", name, help, name, kind, name, value);
        }
        out
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text metrics", body = MetricsResponse)
    )
)]
pub async fn get_metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::collect(&state).render())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prometheus_text() {
        let text = MetricsResponse {
            logins_total: 3,
            document_saves_total: 7,
            rating_emails_total: 1,
            active_sessions: 2,
        }
        .render();

        assert!(text.contains("# TYPE logins_total counter\nlogins_total 3\n"));
        assert!(text.contains("# TYPE active_sessions gauge\nactive_sessions 2\n"));
        assert_eq!(text.lines().count(), 12);
    }
}
