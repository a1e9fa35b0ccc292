use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;

use super::api::Backend;
use super::device::device_fingerprint;
use super::error::ClientError;
use super::storage::{document_key, LocalStore};
use crate::models::{
    Appointment, AppointmentStatus, BonusEntry, Booking, BookingRequest, BusinessProfile,
    BusinessStats, Client, ClientPatch, CreateSavePointRequest, DomainError, Expense,
    NewBonusEntry, NewClient, NewExpense, Rating, RatingRequestBody, SavePointSummary,
    StatusChange, UserDocument,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    LocalCache,
    /// Nothing stored anywhere yet
    Empty,
    /// Backend unreachable and no local copy. Nothing is loaded, so nothing
    /// can overwrite the remote document; the next call tries again.
    Unavailable,
    AlreadyLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Remote save failed, the document went to the local cache
    CachedLocally,
    /// Another save was in flight
    Dropped,
    /// The document has not been loaded yet
    Suppressed,
    Failed,
}

struct Inner {
    backend: Arc<dyn Backend>,
    storage: LocalStore,
    email: String,
    device_id: String,
    device_name: Option<String>,
    debounce: Duration,
    document: Mutex<UserDocument>,
    load_started: AtomicBool,
    loaded: AtomicBool,
    generation: AtomicU64,
    /// Held for the whole round trip of a save
    save_lock: tokio::sync::Mutex<()>,
}

impl Inner {
    fn document(&self) -> MutexGuard<'_, UserDocument> {
        // A panic mid-mutation leaves a usable document behind
        self.document.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The signed-in account's document, kept in memory and written back to the
/// backend a short while after the last change.
#[derive(Clone)]
pub struct StateContainer {
    inner: Arc<Inner>,
}

impl StateContainer {
    pub fn new(
        backend: Arc<dyn Backend>,
        storage: LocalStore,
        email: &str,
        device_name: Option<String>,
        debounce: Duration,
    ) -> Result<Self, ClientError> {
        let device_id = device_fingerprint(&storage)?;
        Ok(StateContainer {
            inner: Arc::new(Inner {
                backend,
                storage,
                email: email.to_string(),
                device_id,
                device_name,
                debounce,
                document: Mutex::new(UserDocument::default()),
                load_started: AtomicBool::new(false),
                loaded: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                save_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub fn email(&self) -> &str {
        &self.inner.email
    }

    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::SeqCst)
    }

    /// Fetches the remote document the first time it is called. When the
    /// backend cannot be reached the last locally cached copy is used; with
    /// no cached copy the container stays unloaded and a later call retries.
    pub async fn load_once(&self) -> LoadSource {
        if self
            .inner
            .load_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return LoadSource::AlreadyLoaded;
        }

        let (document, source) = match self.inner.backend.load().await {
            Ok(Some(document)) => (document, LoadSource::Remote),
            Ok(None) => (UserDocument::default(), LoadSource::Empty),
            Err(e) => {
                log::warn!("⚠️  Could not load data for {}, trying local cache: {}", self.inner.email, e);
                let cached = match self.inner.storage.get::<UserDocument>(&document_key(&self.inner.email)) {
                    Ok(cached) => cached,
                    Err(e) => {
                        log::warn!("⚠️  Local cache unreadable: {}", e);
                        None
                    }
                };
                match cached {
                    Some(document) => (document, LoadSource::LocalCache),
                    None => {
                        log::warn!("⚠️  No data available for {}, will retry the load", self.inner.email);
                        self.inner.load_started.store(false, Ordering::SeqCst);
                        return LoadSource::Unavailable;
                    }
                }
            }
        };

        *self.inner.document() = document;
        self.inner.loaded.store(true, Ordering::SeqCst);
        log::info!("📥 Loaded data for {} ({:?})", self.inner.email, source);
        source
    }

    pub fn snapshot(&self) -> UserDocument {
        self.inner.document().clone()
    }

    /// Runs `f` against the current document without scheduling a save.
    pub fn read<T>(&self, f: impl FnOnce(&UserDocument) -> T) -> T {
        f(&*self.inner.document())
    }

    pub fn stats(&self) -> BusinessStats {
        self.read(UserDocument::stats)
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut UserDocument) -> Result<T, DomainError>,
    ) -> Result<T, ClientError> {
        if !self.is_loaded() {
            return Err(ClientError::NotLoaded);
        }
        let result = {
            let mut document = self.inner.document();
            f(&mut document)?
        };
        self.schedule_save();
        Ok(result)
    }

    /// Restarts the debounce timer. Timers superseded by a later mutation
    /// see a newer generation and exit without saving.
    fn schedule_save(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("⚠️  No async runtime, change kept until the next flush");
                return;
            }
        };

        let container = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(container.inner.debounce).await;
            if container.inner.generation.load(Ordering::SeqCst) == generation {
                container.save_now().await;
            }
        });
    }

    /// Sends the whole document to the backend. An overlapping call is
    /// dropped, not queued.
    pub async fn save_now(&self) -> SaveOutcome {
        if !self.is_loaded() {
            return SaveOutcome::Suppressed;
        }
        let _guard = match self.inner.save_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::debug!("Save already in flight, skipping");
                return SaveOutcome::Dropped;
            }
        };
        self.write_through().await
    }

    /// Cancels the pending debounce timer, waits for a save in flight and
    /// then saves the current document.
    pub async fn flush_now(&self) -> SaveOutcome {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if !self.is_loaded() {
            return SaveOutcome::Suppressed;
        }
        let _guard = self.inner.save_lock.lock().await;
        self.write_through().await
    }

    /// Caller holds `save_lock`.
    async fn write_through(&self) -> SaveOutcome {
        let document = self.snapshot();
        match self.inner.backend.save(&document).await {
            Ok(()) => {
                log::debug!("💾 Saved data for {}", self.inner.email);
                SaveOutcome::Saved
            }
            Err(e) => {
                log::warn!("⚠️  Save failed, keeping a local copy: {}", e);
                match self.inner.storage.set(&document_key(&self.inner.email), &document) {
                    Ok(()) => SaveOutcome::CachedLocally,
                    Err(e) => {
                        log::error!("❌ Could not cache data locally: {}", e);
                        SaveOutcome::Failed
                    }
                }
            }
        }
    }

    pub fn update_business_profile(&self, profile: BusinessProfile) -> Result<(), ClientError> {
        self.mutate(|doc| {
            doc.business_profile = profile;
            Ok(())
        })
    }

    pub fn add_client(&self, input: NewClient) -> Result<Client, ClientError> {
        self.mutate(|doc| doc.add_client(input))
    }

    pub fn update_client(&self, id: &str, patch: ClientPatch) -> Result<Client, ClientError> {
        self.mutate(|doc| doc.update_client(id, patch))
    }

    pub fn remove_client(&self, id: &str) -> Result<Client, ClientError> {
        self.mutate(|doc| doc.remove_client(id))
    }

    pub fn book_appointment(&self, request: BookingRequest) -> Result<Booking, ClientError> {
        self.mutate(|doc| doc.book_appointment(request))
    }

    /// Changes the status and, when the appointment just became COMPLETED,
    /// asks the backend to email its primary client a rating link.
    pub async fn set_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<StatusChange, ClientError> {
        let (change, rating_request) = self.mutate(|doc| {
            let change = doc.set_appointment_status(id, status)?;
            let rating_request = if change.entered_completed {
                rating_request_for(doc, &change.appointment)
            } else {
                None
            };
            Ok((change, rating_request))
        })?;

        if let Some(body) = rating_request {
            match self.inner.backend.request_rating(&body).await {
                Ok(receipt) => log::info!("⭐ Rating request sent to {}: {}", body.client_email, receipt.rating_link),
                Err(e) => log::warn!("⚠️  Rating request for appointment {} failed: {}", body.appointment_id, e),
            }
        }

        Ok(change)
    }

    pub fn remove_appointment(&self, id: &str) -> Result<Appointment, ClientError> {
        self.mutate(|doc| doc.remove_appointment(id))
    }

    pub fn add_expense(&self, input: NewExpense) -> Result<Expense, ClientError> {
        self.mutate(|doc| doc.add_expense(input))
    }

    pub fn remove_expense(&self, id: &str) -> Result<Expense, ClientError> {
        self.mutate(|doc| doc.remove_expense(id))
    }

    pub fn add_bonus_entry(&self, input: NewBonusEntry) -> Result<BonusEntry, ClientError> {
        self.mutate(|doc| doc.add_bonus_entry(input))
    }

    pub fn record_rating(
        &self,
        appointment_id: &str,
        score: i32,
        comment: Option<String>,
    ) -> Result<Rating, ClientError> {
        self.mutate(|doc| doc.record_rating(appointment_id, score, comment))
    }

    // ==================== SAVE POINTS ====================

    pub async fn create_save_point(&self, label: Option<&str>) -> Result<SavePointSummary, ClientError> {
        if !self.is_loaded() {
            return Err(ClientError::NotLoaded);
        }
        let request = CreateSavePointRequest {
            device_id: self.inner.device_id.clone(),
            device_name: self.inner.device_name.clone(),
            label: label.map(str::to_string),
            data: serde_json::to_value(self.snapshot())?,
        };
        let summary = self.inner.backend.create_save_point(&request).await?;
        log::info!("📸 Save point {} created from {}", summary.id, self.inner.device_id);
        Ok(summary)
    }

    pub async fn list_save_points(&self) -> Result<Vec<SavePointSummary>, ClientError> {
        self.inner.backend.list_save_points().await
    }

    /// Replaces the local document with the snapshot and schedules a save.
    pub async fn restore_save_point(&self, id: &str) -> Result<SavePointSummary, ClientError> {
        if !self.is_loaded() {
            return Err(ClientError::NotLoaded);
        }
        let save_point = self.inner.backend.get_save_point(id).await?;
        let document: UserDocument = serde_json::from_value(save_point.data.clone())?;

        *self.inner.document() = document;
        self.schedule_save();
        log::info!("⏪ Restored save point {}", save_point.id);
        Ok(SavePointSummary::from(&save_point))
    }

    pub async fn delete_save_point(&self, id: &str) -> Result<(), ClientError> {
        self.inner.backend.delete_save_point(id).await
    }
}

fn rating_request_for(doc: &UserDocument, appointment: &Appointment) -> Option<RatingRequestBody> {
    let client = doc.client(appointment.primary_client_id()?)?;
    let client_email = client.email.clone()?;
    let business_name = Some(doc.business_profile.name.trim().to_string()).filter(|n| !n.is_empty());

    Some(RatingRequestBody {
        appointment_id: appointment.id.clone(),
        client_name: client.name.clone(),
        client_email,
        business_name,
    })
}
