//! Schedule gate: run the full scheduling pass at most once per dataset version.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::platform::KeyValueStore;
use crate::storage::keys;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGate {
    pub dataset_version: u64,
    pub last_scheduled_version: Option<u64>,
}

impl ScheduleGate {
    /// Reads the persisted record. The legacy `"true"`/`"false"` flag values
    /// map to an already-scheduled or unscheduled version 0.
    pub fn from_persisted(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("false") | Some("") => Self::default(),
            Some("true") => Self {
                dataset_version: 0,
                last_scheduled_version: Some(0),
            },
            Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
                debug!("Unreadable schedule gate record, treating as unscheduled: {}", e);
                Self::default()
            }),
        }
    }

    /// True when the current dataset version has already been scheduled.
    pub fn is_current(&self) -> bool {
        self.last_scheduled_version == Some(self.dataset_version)
    }

    pub fn mark_scheduled(&mut self) {
        self.last_scheduled_version = Some(self.dataset_version);
    }

    /// Records that the dataset changed, reopening the gate.
    pub fn invalidate(&mut self) {
        self.dataset_version += 1;
    }

    pub async fn load(store: &dyn KeyValueStore) -> AppResult<Self> {
        let raw = store.get(keys::SCHEDULE_GATE).await?;
        Ok(Self::from_persisted(raw.as_deref()))
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> AppResult<()> {
        let raw = serde_json::to_string(self)?;
        store.set(keys::SCHEDULE_GATE, &raw).await
    }
}

/// Loads, invalidates and saves the gate in one step.
pub async fn invalidate(store: &dyn KeyValueStore) -> AppResult<ScheduleGate> {
    let mut gate = ScheduleGate::load(store).await?;
    gate.invalidate();
    gate.save(store).await?;
    Ok(gate)
}

/// Marks `version` as scheduled against the record as it is now, so a bump
/// made while the pass was running keeps the gate open.
pub async fn record_scheduled(store: &dyn KeyValueStore, version: u64) -> AppResult<ScheduleGate> {
    let mut gate = ScheduleGate::load(store).await?;
    gate.last_scheduled_version = Some(version);
    gate.save(store).await?;
    Ok(gate)
}
