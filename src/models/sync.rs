// file: src/sync.rs
use serde::{Deserialize, Serialize};

/// Where a note sync run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteSyncState {
    NoRemoteDocument,
    RemoteMatchesLocalKey,
    RemoteKeyMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteSyncOutcome {
    /// Nobody is logged in; nothing to sync.
    NotLoggedIn,
    /// The connectivity probe failed; sync skipped.
    Offline,
    /// Local notes were written to the remote document.
    Uploaded,
    /// The remote document replaced the local notes.
    Restored,
    /// Local and remote already agree.
    InSync,
    /// The remote document was sealed with a different key; nothing changed.
    KeyMismatch,
}

impl NoteSyncOutcome {
    pub fn changed_data(&self) -> bool {
        matches!(self, Self::Uploaded | Self::Restored)
    }
}

/// Counts collected over one full scheduling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleReport {
    /// The gate was already closed for this dataset version.
    pub skipped: bool,
    pub class_events: usize,
    pub exam_events: usize,
    pub event_requests: usize,
    pub digest_requests: usize,
    pub note_requests: usize,
    pub failures: usize,
}

impl ScheduleReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn total_requests(&self) -> usize {
        self.event_requests + self.digest_requests + self.note_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_changed_data() {
        assert!(NoteSyncOutcome::Uploaded.changed_data());
        assert!(NoteSyncOutcome::Restored.changed_data());
        assert!(!NoteSyncOutcome::InSync.changed_data());
        assert!(!NoteSyncOutcome::KeyMismatch.changed_data());
    }

    #[test]
    fn test_report_totals() {
        let report = ScheduleReport {
            event_requests: 8,
            digest_requests: 30,
            note_requests: 1,
            ..ScheduleReport::default()
        };
        assert_eq!(report.total_requests(), 39);
        assert!(ScheduleReport::skipped().skipped);
    }
}
