use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::models::{RatingRequest, RatingRequestBody, RatingRequestReceipt};
use crate::state::AppState;
use crate::utils::{generate_token, normalize_email, now_millis, AppError};

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let mut builder = if !config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        } else if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| AppError::Internal(format!("Invalid SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| AppError::Internal(format!("Invalid SMTP relay: {}", e)))?
        };

        builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(SmtpMailer {
            transport: builder.build(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Internal(format!("Invalid sender address: {}", e)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| AppError::InvalidRequest(format!("Invalid recipient address: {}", e)))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {}", e)))?;
        Ok(())
    }
}

/// Used when SMTP is not configured: the email is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), AppError> {
        log::info!("📧 [mail disabled] To: {} | Subject: {}\n{}", email.to, email.subject, email.body);
        Ok(())
    }
}

fn rating_email(request: &RatingRequest, link: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: request.client_email.clone(),
        subject: format!("How was your visit to {}?", request.business_name),
        body: format!(
            "Hi {},\n\n\
             Thank you for visiting {}. We'd love to hear how it went.\n\
             Please rate your appointment here:\n\n{}\n\n\
             The link can be used once.\n",
            request.client_name, request.business_name, link
        ),
    }
}

/// Creates a one-time rating link for an appointment of `owner_email` and
/// emails it to the client.
pub async fn request_rating(
    state: &AppState,
    owner_email: &str,
    body: RatingRequestBody,
) -> Result<RatingRequestReceipt, AppError> {
    let store = state.store()?;

    if body.appointment_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("appointment_id is required".to_string()));
    }
    let client_email = normalize_email(&body.client_email);
    if !client_email.contains('@') {
        return Err(AppError::InvalidRequest("A valid client_email is required".to_string()));
    }

    let business_name = match body.business_name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None => store
            .load_document(owner_email)
            .await?
            .map(|doc| doc.business_profile.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "our business".to_string()),
    };

    let request = RatingRequest {
        token: generate_token(),
        email: owner_email.to_string(),
        appointment_id: body.appointment_id,
        business_name,
        client_name: body.client_name,
        client_email,
        created_at: now_millis(),
        used_at: None,
    };
    store.insert_rating_request(&request).await?;

    let link = format!("{}/rate/{}", state.config.public_url.trim_end_matches('/'), request.token);
    if let Err(e) = state.mailer.send(rating_email(&request, &link)).await {
        log::error!("❌ Failed to email rating request for appointment {}: {}", request.appointment_id, e);
        return Err(e);
    }
    crate::api::metrics::increment_rating_email_count();

    log::info!(
        "⭐ Rating request sent to {} for appointment {}",
        request.client_email,
        request.appointment_id
    );
    Ok(RatingRequestReceipt {
        success: true,
        rating_link: link,
    })
}
