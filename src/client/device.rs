use uuid::Uuid;

use super::error::ClientError;
use super::storage::{LocalStore, DEVICE_ID_KEY};

/// Random per-device identifier, generated on first use and then kept in
/// local storage. It labels save points with the device that made them.
pub fn device_fingerprint(storage: &LocalStore) -> Result<String, ClientError> {
    match storage.get::<String>(DEVICE_ID_KEY) {
        Ok(Some(id)) if !id.is_empty() => return Ok(id),
        Ok(_) => {}
        Err(e) => log::warn!("⚠️  Unreadable device id, generating a new one: {}", e),
    }

    let id = format!("dev-{}", Uuid::new_v4().simple());
    storage.set(DEVICE_ID_KEY, &id)?;
    log::info!("🖥️  New device fingerprint {}", id);
    Ok(id)
}
