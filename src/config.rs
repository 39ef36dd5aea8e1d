//! Configuration validation module
//!
//! Settings come from the `settings` table with environment overrides on top;
//! this is the single place that decides whether the result is usable.

use log::info;

use crate::error::{AppError, AppResult};
use crate::models::Settings;

/// Longest digest horizon accepted, one year.
pub const MAX_DIGEST_HORIZON_DAYS: u32 = 366;

/// Validates a settings value before the app starts using it.
///
/// # Returns
///
/// * `Ok(())` - settings are usable
/// * `Err(AppError::Config)` - the first problem found
pub fn validate_settings(settings: &Settings) -> AppResult<()> {
    settings.tz()?;

    if settings.digest_hour > 23 {
        return Err(AppError::config(format!(
            "digest hour must be between 0 and 23, got {}",
            settings.digest_hour
        )));
    }

    if settings.lead_times_minutes.is_empty() {
        return Err(AppError::config("at least one lead time is required"));
    }

    if settings.digest_horizon_days == 0 {
        return Err(AppError::config("digest horizon must be at least one day"));
    }

    if settings.digest_horizon_days > MAX_DIGEST_HORIZON_DAYS {
        return Err(AppError::config(format!(
            "digest horizon must be at most {} days, got {}",
            MAX_DIGEST_HORIZON_DAYS, settings.digest_horizon_days
        )));
    }

    if settings.refresh_window_end < settings.refresh_window_start {
        return Err(AppError::config(format!(
            "refresh window ends ({}) before it starts ({})",
            settings.refresh_window_end, settings.refresh_window_start
        )));
    }

    if settings.background_check_interval_secs == 0 {
        return Err(AppError::config("background check interval must be positive"));
    }

    if settings.remote_collection.trim().is_empty() {
        return Err(AppError::config("remote collection name cannot be empty"));
    }

    info!(
        "Configuration valid: tz={}, lead times={:?}, digest at {}:00",
        settings.timezone, settings.lead_times_minutes, settings.digest_hour
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_defaults_pass() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = vec![
            Settings {
                timezone: "Nowhere/Special".to_string(),
                ..Settings::default()
            },
            Settings {
                digest_hour: 24,
                ..Settings::default()
            },
            Settings {
                lead_times_minutes: vec![],
                ..Settings::default()
            },
            Settings {
                digest_horizon_days: 0,
                ..Settings::default()
            },
            Settings {
                digest_horizon_days: 95_000_000,
                ..Settings::default()
            },
            Settings {
                refresh_window_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                refresh_window_end: NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
                ..Settings::default()
            },
        ];
        for settings in cases {
            assert!(matches!(validate_settings(&settings), Err(AppError::Config(_))));
        }
    }

    #[test]
    fn test_horizon_upper_bound_is_inclusive() {
        let settings = Settings {
            digest_horizon_days: MAX_DIGEST_HORIZON_DAYS,
            ..Settings::default()
        };
        assert!(validate_settings(&settings).is_ok());
    }
}
