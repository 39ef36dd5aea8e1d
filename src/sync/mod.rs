//! Remote note sync
//!
//! Reconciles the local note list with the user's sealed remote document:
//!
//! - no remote document: upload local notes, mark synced
//! - remote present but opens with a different key: abort, warn, change nothing
//! - remote present, local never synced: local wins, upload
//! - remote present, local synced: remote wins when the two differ
//!
//! Any change to the note data reopens the schedule gate and reruns the full
//! scheduling pass.

pub mod crypto;

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::AppResult;
use crate::models::{NoteSyncOutcome, RemoteSyncState};
use crate::notifications::{messages, NotificationService};
use crate::platform::{Connectivity, KeyValueStore, RemoteDocument, RemoteDocumentStore};
use crate::storage::{self, keys};
use crate::utils::logging::{log_note_sync, log_scheduling_failure};

pub use crypto::EncryptedBlob;

/// Seconds until the follow-up reminder after a key mismatch.
const KEY_UPDATE_REMINDER_SECS: u64 = 10;

pub struct NoteSync {
    store: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemoteDocumentStore>,
    connectivity: Arc<dyn Connectivity>,
    notifications: Arc<NotificationService>,
}

impl NoteSync {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteDocumentStore>,
        connectivity: Arc<dyn Connectivity>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            notifications,
        }
    }

    async fn local_notes(&self) -> AppResult<Option<String>> {
        self.store.get(keys::NOTES).await
    }

    async fn upload_local(&self, user_id: &str, key: &str) -> AppResult<()> {
        let Some(raw) = self.local_notes().await? else {
            debug!("No local notes to upload");
            return Ok(());
        };
        let value: Value = serde_json::from_str(&raw)?;
        let blob = EncryptedBlob::seal(&value, key)?;
        self.remote
            .put(
                user_id,
                RemoteDocument {
                    encrypted_data: blob.to_wire(),
                },
            )
            .await
    }

    async fn warn_key_mismatch(&self) {
        if let Err(e) = self
            .notifications
            .send_immediate(messages::KEY_MISMATCH_TITLE, messages::KEY_MISMATCH_BODY)
            .await
        {
            log_scheduling_failure("key mismatch warning", &e);
        }
        if let Err(e) = self
            .notifications
            .schedule_in(messages::KEY_UPDATE_TITLE, messages::KEY_UPDATE_BODY, KEY_UPDATE_REMINDER_SECS)
            .await
        {
            log_scheduling_failure("key update reminder", &e);
        }
    }

    /// Compares the opened remote value with the stored notes; the remote
    /// value replaces them when they differ.
    async fn reconcile(&self, remote_value: Value) -> AppResult<NoteSyncOutcome> {
        let local: Option<Value> = self
            .local_notes()
            .await?
            .and_then(|raw| serde_json::from_str(&raw).ok());

        if local.as_ref() == Some(&remote_value) {
            info!("Notes already in sync");
            return Ok(NoteSyncOutcome::InSync);
        }

        let raw = serde_json::to_string(&remote_value)?;
        self.store.set(keys::NOTES, &raw).await?;
        Ok(NoteSyncOutcome::Restored)
    }

    pub async fn sync_remote_notes(&self) -> AppResult<NoteSyncOutcome> {
        let started = Instant::now();

        let Some(user_id) = self.store.get(keys::USERNAME).await? else {
            info!("Note sync skipped: no user logged in");
            return Ok(NoteSyncOutcome::NotLoggedIn);
        };

        if !self.connectivity.is_reachable().await {
            info!("Note sync skipped: network unavailable");
            return Ok(NoteSyncOutcome::Offline);
        }

        let key = crypto::get_or_create_user_key(self.store.as_ref()).await?;
        let synced_before = storage::get_flag(self.store.as_ref(), keys::SYNC_NOTES_STATUS).await?;
        let notifications_scheduled =
            storage::get_flag(self.store.as_ref(), keys::NOTIFICATIONS_SCHEDULED).await?;

        let (state, outcome) = match self.remote.fetch(&user_id).await? {
            None => {
                self.upload_local(&user_id, &key).await?;
                storage::set_flag(self.store.as_ref(), keys::SYNC_NOTES_STATUS, true).await?;
                (RemoteSyncState::NoRemoteDocument, NoteSyncOutcome::Uploaded)
            }
            Some(document) => {
                match EncryptedBlob::parse(&document.encrypted_data).and_then(|blob| blob.open(&key)) {
                    Err(e) => {
                        warn!("Remote notes do not open with the local key, aborting sync: {}", e);
                        self.warn_key_mismatch().await;
                        log_note_sync(&user_id, NoteSyncOutcome::KeyMismatch, started.elapsed().as_millis() as u64);
                        return Ok(NoteSyncOutcome::KeyMismatch);
                    }
                    Ok(_) if !synced_before => {
                        self.upload_local(&user_id, &key).await?;
                        storage::set_flag(self.store.as_ref(), keys::SYNC_NOTES_STATUS, true).await?;
                        (RemoteSyncState::RemoteMatchesLocalKey, NoteSyncOutcome::Uploaded)
                    }
                    Ok(remote_value) => (RemoteSyncState::RemoteMatchesLocalKey, self.reconcile(remote_value).await?),
                }
            }
        };
        debug!("Note sync state {:?} -> {:?}", state, outcome);

        if outcome.changed_data() || !notifications_scheduled {
            self.notifications.invalidate_schedule().await?;
            self.notifications.schedule_all_notifications().await?;
            storage::set_flag(self.store.as_ref(), keys::NOTIFICATIONS_SCHEDULED, true).await?;
            if let Err(e) = self
                .notifications
                .send_immediate(messages::SYNC_DONE_TITLE, messages::SYNC_DONE_BODY)
                .await
            {
                log_scheduling_failure("sync confirmation", &e);
            }
        }

        log_note_sync(&user_id, outcome, started.elapsed().as_millis() as u64);
        Ok(outcome)
    }
}
