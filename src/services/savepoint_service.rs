use crate::database::DocumentStore;
use crate::models::{CreateSavePointRequest, Device, SavePoint, SavePointSummary};
use crate::utils::{new_id, now_millis, AppError};

/// Records the device, then stores the snapshot. The two writes are
/// sequential: a failure on the second one leaves the device entry behind.
pub async fn create(
    store: &dyn DocumentStore,
    email: &str,
    request: CreateSavePointRequest,
) -> Result<SavePoint, AppError> {
    let device_id = request.device_id.trim().to_string();
    if device_id.is_empty() {
        return Err(AppError::InvalidRequest("device_id is required".to_string()));
    }
    if !request.data.is_object() {
        return Err(AppError::InvalidRequest("data must be a JSON object".to_string()));
    }

    let now = now_millis();
    let device_name = request.device_name.filter(|n| !n.trim().is_empty());

    store
        .upsert_device(&Device {
            email: email.to_string(),
            device_id: device_id.clone(),
            device_name: device_name.clone(),
            first_seen: now,
            last_seen: now,
        })
        .await?;

    let save_point = SavePoint {
        id: new_id(),
        email: email.to_string(),
        device_id,
        device_name,
        label: request.label.filter(|l| !l.trim().is_empty()),
        data: request.data,
        created_at: now,
    };
    store.insert_save_point(&save_point).await?;

    log::info!("📸 Save point {} created for {} from {}", save_point.id, email, save_point.device_id);
    Ok(save_point)
}

pub async fn list(store: &dyn DocumentStore, email: &str) -> Result<Vec<SavePointSummary>, AppError> {
    store.list_save_points(email).await
}

pub async fn get(store: &dyn DocumentStore, email: &str, id: &str) -> Result<SavePoint, AppError> {
    store
        .find_save_point(email, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Save point {} not found", id)))
}

pub async fn delete(store: &dyn DocumentStore, email: &str, id: &str) -> Result<(), AppError> {
    if store.delete_save_point(email, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Save point {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn request(data: serde_json::Value) -> CreateSavePointRequest {
        CreateSavePointRequest {
            device_id: "dev-123".into(),
            device_name: Some("Front desk".into()),
            label: Some("Before cleanup".into()),
            data,
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_returned_unchanged() {
        let store = MemoryStore::new();
        let data = json!({
            "businessProfile": { "name": "Studio" },
            "clients": [{ "id": "c1", "name": "Ana", "extra": [1, 2, 3] }],
            "appointments": []
        });

        let created = create(&store, "a@x.com", request(data.clone())).await.unwrap();
        let fetched = get(&store, "a@x.com", &created.id).await.unwrap();
        assert_eq!(fetched.data, data);
        assert_eq!(fetched.device_id, "dev-123");
    }

    #[tokio::test]
    async fn test_validation_and_ownership() {
        let store = MemoryStore::new();
        let mut bad = request(json!({}));
        bad.device_id = "  ".into();
        assert!(matches!(create(&store, "a@x.com", bad).await, Err(AppError::InvalidRequest(_))));
        assert!(matches!(
            create(&store, "a@x.com", request(json!([1, 2]))).await,
            Err(AppError::InvalidRequest(_))
        ));

        let created = create(&store, "a@x.com", request(json!({}))).await.unwrap();
        assert!(matches!(get(&store, "b@x.com", &created.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&store, "b@x.com", &created.id).await, Err(AppError::NotFound(_))));

        delete(&store, "a@x.com", &created.id).await.unwrap();
        assert!(list(&store, "a@x.com").await.unwrap().is_empty());
    }
}
