// file: src/settings.rs
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

pub const DEFAULT_TIMEZONE: &str = "Asia/Ho_Chi_Minh";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub lead_times_minutes: Vec<u32>,     // minutes before start
    pub digest_hour: u32,                 // local hour on the eve
    pub digest_horizon_days: u32,
    pub timezone: String,
    pub background_check_interval_secs: u64,
    pub refresh_window_start: NaiveTime,
    pub refresh_window_end: NaiveTime,
    pub refresh_max_attempts: u32,
    pub refresh_retry_delay_secs: u64,
    pub remote_collection: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lead_times_minutes: vec![60, 30, 15, 0],
            digest_hour: 20,
            digest_horizon_days: 30,
            timezone: DEFAULT_TIMEZONE.to_string(),
            background_check_interval_secs: 15 * 60,
            refresh_window_start: NaiveTime::from_hms_opt(1, 1, 0).unwrap_or_default(),
            refresh_window_end: NaiveTime::from_hms_opt(6, 30, 0).unwrap_or_default(),
            refresh_max_attempts: 3,
            refresh_retry_delay_secs: 5 * 60,
            remote_collection: "user_data_sync".to_string(),
        }
    }
}

impl Settings {
    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::config(format!("Unknown timezone '{}': {}", self.timezone, e)))
    }

    /// Applies `CLASSCHIME_TZ` when present.
    pub fn from_env_overrides(mut self) -> Self {
        if let Ok(tz) = std::env::var("CLASSCHIME_TZ") {
            if !tz.trim().is_empty() {
                self.timezone = tz.trim().to_string();
            }
        }
        self
    }

    pub fn in_refresh_window(&self, local_time: NaiveTime) -> bool {
        local_time >= self.refresh_window_start && local_time <= self.refresh_window_end
    }
}

/// Parses a comma separated lead-time list such as `"60,30,15,0"`.
pub fn parse_lead_times(value: &str) -> Option<Vec<u32>> {
    value
        .split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect()
}
