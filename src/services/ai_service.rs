use serde::{Deserialize, Serialize};

use crate::database::DocumentStore;
use crate::models::{
    Appointment, AppointmentStatus, Booking, BookingRequest, BusinessStats, Client, NewClient,
    RatingRequestBody, UserDocument,
};
use crate::services::notification_service;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    /// Case-insensitive match on name, email or phone
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    /// YYYY-MM-DD
    pub date: Option<String>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub appointment: Appointment,
    pub rating_request_sent: bool,
}

async fn load_or_default(store: &dyn DocumentStore, email: &str) -> Result<UserDocument, AppError> {
    Ok(store.load_document(email).await?.unwrap_or_default())
}

pub async fn stats(store: &dyn DocumentStore, email: &str) -> Result<BusinessStats, AppError> {
    Ok(load_or_default(store, email).await?.stats())
}

pub async fn list_clients(
    store: &dyn DocumentStore,
    email: &str,
    query: &ClientQuery,
) -> Result<Vec<Client>, AppError> {
    let document = load_or_default(store, email).await?;
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let matches = |client: &Client| match &needle {
        None => true,
        Some(needle) => {
            client.name.to_lowercase().contains(needle)
                || client.email.as_deref().map(|e| e.to_lowercase().contains(needle)).unwrap_or(false)
                || client.phone.as_deref().map(|p| p.contains(needle.as_str())).unwrap_or(false)
        }
    };

    Ok(document.clients.into_iter().filter(|c| matches(c)).collect())
}

pub async fn add_client(store: &dyn DocumentStore, email: &str, input: NewClient) -> Result<Client, AppError> {
    let mut document = load_or_default(store, email).await?;
    let client = document.add_client(input)?;
    store.save_document(email, &document).await?;
    Ok(client)
}

pub async fn list_appointments(
    store: &dyn DocumentStore,
    email: &str,
    query: &AppointmentQuery,
) -> Result<Vec<Appointment>, AppError> {
    let document = load_or_default(store, email).await?;
    let mut appointments: Vec<Appointment> = document
        .appointments
        .into_iter()
        .filter(|a| query.date.as_deref().map(|d| a.date == d).unwrap_or(true))
        .filter(|a| query.status.map(|s| a.status == s).unwrap_or(true))
        .collect();
    appointments.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
    Ok(appointments)
}

pub async fn book_appointment(
    store: &dyn DocumentStore,
    email: &str,
    request: BookingRequest,
) -> Result<Booking, AppError> {
    let mut document = load_or_default(store, email).await?;
    let booking = document.book_appointment(request)?;
    store.save_document(email, &document).await?;
    Ok(booking)
}

/// Changes an appointment's status. Entering COMPLETED sends one rating
/// request to the primary client when that client has an email.
pub async fn update_status(
    state: &AppState,
    email: &str,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<StatusUpdate, AppError> {
    let store = state.store()?;
    let mut document = load_or_default(store, email).await?;
    let change = document.set_appointment_status(appointment_id, status)?;
    store.save_document(email, &document).await?;

    let mut rating_request_sent = false;
    if change.entered_completed {
        let client = change
            .appointment
            .primary_client_id()
            .and_then(|id| document.client(id))
            .filter(|c| c.email.is_some());

        if let Some(client) = client {
            let body = RatingRequestBody {
                appointment_id: change.appointment.id.clone(),
                client_name: client.name.clone(),
                client_email: client.email.clone().unwrap_or_default(),
                business_name: Some(document.business_profile.name.clone()),
            };
            match notification_service::request_rating(state, email, body).await {
                Ok(_) => rating_request_sent = true,
                Err(e) => log::warn!("⚠️  Rating request for {} not sent: {}", appointment_id, e),
            }
        }
    }

    Ok(StatusUpdate {
        appointment: change.appointment,
        rating_request_sent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state_with_mailer, RecordingMailer};
    use std::sync::Arc;

    async fn booked(state: &AppState, with_email: bool) -> String {
        let booking = book_appointment(
            state.store().unwrap(),
            "owner@x.com",
            BookingRequest {
                client_name: Some("Ana".into()),
                client_email: with_email.then(|| "ana@x.com".to_string()),
                date: "2026-03-02".into(),
                time: "11:00".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        booking.appointment.id
    }

    #[tokio::test]
    async fn test_completing_sends_one_rating_request() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state_with_mailer(mailer.clone());
        let id = booked(&state, true).await;

        let first = update_status(&state, "owner@x.com", &id, AppointmentStatus::Completed).await.unwrap();
        assert!(first.rating_request_sent);
        let second = update_status(&state, "owner@x.com", &id, AppointmentStatus::Completed).await.unwrap();
        assert!(!second.rating_request_sent);

        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_completing_without_client_email_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state_with_mailer(mailer.clone());
        let id = booked(&state, false).await;

        let update = update_status(&state, "owner@x.com", &id, AppointmentStatus::Completed).await.unwrap();
        assert!(!update.rating_request_sent);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_filters() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state_with_mailer(mailer);
        let store = state.store().unwrap();
        booked(&state, true).await;
        add_client(store, "owner@x.com", NewClient { name: "Bruno".into(), ..Default::default() })
            .await
            .unwrap();

        let found = list_clients(store, "owner@x.com", &ClientQuery { search: Some("bru".into()) })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Bruno");

        let on_day = list_appointments(
            store,
            "owner@x.com",
            &AppointmentQuery { date: Some("2026-03-02".into()), status: Some(AppointmentStatus::Pending) },
        )
        .await
        .unwrap();
        assert_eq!(on_day.len(), 1);

        let stats = stats(store, "owner@x.com").await.unwrap();
        assert_eq!(stats.total_clients, 2);
    }
}
