use crate::database::DocumentStore;
use crate::models::UserDocument;
use crate::utils::AppError;

/// Stored document for `email`, or None when the account never saved one.
pub async fn load(store: &dyn DocumentStore, email: &str) -> Result<Option<UserDocument>, AppError> {
    store.load_document(email).await
}

/// Replaces the whole document (no field-level merge).
pub async fn save(store: &dyn DocumentStore, email: &str, document: &UserDocument) -> Result<(), AppError> {
    store.save_document(email, document).await?;
    log::debug!(
        "💾 Document saved for {} ({} clients, {} appointments)",
        email,
        document.clients.len(),
        document.appointments.len()
    );
    Ok(())
}
