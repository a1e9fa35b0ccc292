pub mod ai_service;
pub mod api_key_service;
pub mod auth_service;
pub mod document_service;
pub mod google_service;
pub mod notification_service;
pub mod rating_service;
pub mod savepoint_service;
pub mod session_store;

pub use google_service::{GoogleTokenInfoVerifier, GoogleVerifier};
pub use notification_service::{LogMailer, Mailer, SmtpMailer};
pub use session_store::SessionStore;
