use crate::database::DocumentStore;
use crate::models::{PublicRatingInfo, Rating, RatingRequest, SubmitRatingRequest};
use crate::utils::{now_millis, AppError};

async fn find_request(store: &dyn DocumentStore, token: &str) -> Result<RatingRequest, AppError> {
    store
        .find_rating_request(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Rating link not found".to_string()))
}

pub async fn describe(store: &dyn DocumentStore, token: &str) -> Result<PublicRatingInfo, AppError> {
    let request = find_request(store, token).await?;
    Ok(PublicRatingInfo {
        success: true,
        business_name: request.business_name,
        client_name: request.client_name,
        already_rated: request.used_at.is_some(),
    })
}

/// Records the rating in the owner's document, then marks the link used.
/// Not atomic: a crash between the two writes leaves the link reusable,
/// but the document itself still refuses a second rating.
/// An owner save built from a document loaded before the rating replaces it.
pub async fn submit(
    store: &dyn DocumentStore,
    token: &str,
    submission: SubmitRatingRequest,
) -> Result<Rating, AppError> {
    let request = find_request(store, token).await?;
    if request.used_at.is_some() {
        return Err(AppError::Conflict("This appointment was already rated".to_string()));
    }

    let mut document = store.load_document(&request.email).await?.unwrap_or_default();
    let rating = document.record_rating(&request.appointment_id, submission.score, submission.comment)?;
    store.save_document(&request.email, &document).await?;

    if !store.mark_rating_request_used(token, now_millis()).await? {
        log::warn!("⚠️  Rating link for appointment {} was used concurrently", request.appointment_id);
    }

    log::info!(
        "⭐ Rating {} recorded for appointment {} ({})",
        rating.score,
        request.appointment_id,
        request.email
    );
    Ok(rating)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{AppointmentStatus, BookingRequest, UserDocument};

    async fn seeded() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let mut doc = UserDocument::default();
        let booking = doc
            .book_appointment(BookingRequest {
                client_name: Some("Ana".into()),
                date: "2026-05-10".into(),
                time: "09:00".into(),
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            })
            .unwrap();
        store.save_document("owner@x.com", &doc).await.unwrap();
        store
            .insert_rating_request(&RatingRequest {
                token: "tok-1".into(),
                email: "owner@x.com".into(),
                appointment_id: booking.appointment.id.clone(),
                business_name: "Studio".into(),
                client_name: "Ana".into(),
                client_email: "ana@x.com".into(),
                created_at: 1,
                used_at: None,
            })
            .await
            .unwrap();
        (store, booking.appointment.id)
    }

    #[tokio::test]
    async fn test_submit_records_rating_once() {
        let (store, appointment_id) = seeded().await;

        let info = describe(&store, "tok-1").await.unwrap();
        assert!(!info.already_rated);

        let rating = submit(&store, "tok-1", SubmitRatingRequest { score: 5, comment: Some("Great".into()) })
            .await
            .unwrap();
        assert_eq!(rating.appointment_id, appointment_id);

        let doc = store.load_document("owner@x.com").await.unwrap().unwrap();
        assert_eq!(doc.ratings.len(), 1);
        assert_eq!(doc.appointment(&appointment_id).unwrap().rating, Some(5));

        let again = submit(&store, "tok-1", SubmitRatingRequest { score: 4, comment: None }).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert!(describe(&store, "tok-1").await.unwrap().already_rated);
    }

    #[tokio::test]
    async fn test_stale_owner_save_overwrites_public_rating() {
        let (store, appointment_id) = seeded().await;
        let stale = store.load_document("owner@x.com").await.unwrap().unwrap();

        submit(&store, "tok-1", SubmitRatingRequest { score: 5, comment: None })
            .await
            .unwrap();
        store.save_document("owner@x.com", &stale).await.unwrap();

        // Last writer wins: the rating is gone but the link stays spent.
        let doc = store.load_document("owner@x.com").await.unwrap().unwrap();
        assert!(doc.ratings.is_empty());
        assert_eq!(doc.appointment(&appointment_id).unwrap().rating, None);
        assert!(describe(&store, "tok-1").await.unwrap().already_rated);
        let again = submit(&store, "tok-1", SubmitRatingRequest { score: 5, comment: None }).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_submit_validates_score_and_token() {
        let (store, _) = seeded().await;
        let out_of_range = submit(&store, "tok-1", SubmitRatingRequest { score: 9, comment: None }).await;
        assert!(matches!(out_of_range, Err(AppError::InvalidRequest(_))));

        let unknown = submit(&store, "missing", SubmitRatingRequest { score: 3, comment: None }).await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }
}
