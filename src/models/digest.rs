// file: src/digest.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One "what's tomorrow" reminder, fired the evening before `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDigestEntry {
    pub date: NaiveDate,
    pub event_count: usize,
    pub message: String,
    pub fire_at: DateTime<Utc>,
}

impl DailyDigestEntry {
    /// Days without events carry a filler message instead of a count.
    pub fn is_filler(&self) -> bool {
        self.event_count == 0
    }
}
