// file: src/database/settings.rs
use std::time::Instant;

use anyhow::Result;
use chrono::NaiveTime;
use log::warn;
use sqlx::SqlitePool;

use crate::models::settings::parse_lead_times;
use crate::utils::logging::log_database_operation;

const TIME_FORMAT: &str = "%H:%M";

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).ok()
}

pub async fn get(pool: &SqlitePool) -> Result<crate::models::Settings> {
    let settings = sqlx::query_as::<_, crate::models::Setting>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;

    let defaults = crate::models::Settings::default();
    let mut app_settings = defaults.clone();
    for setting in settings {
        let value = setting.value.as_str();
        match setting.key.as_str() {
            "lead_times_minutes" => {
                app_settings.lead_times_minutes =
                    parse_lead_times(value).unwrap_or_else(|| defaults.lead_times_minutes.clone())
            }
            "digest_hour" => app_settings.digest_hour = value.parse().unwrap_or(defaults.digest_hour),
            "digest_horizon_days" => {
                app_settings.digest_horizon_days = value.parse().unwrap_or(defaults.digest_horizon_days)
            }
            "timezone" => app_settings.timezone = setting.value,
            "background_check_interval_secs" => {
                app_settings.background_check_interval_secs =
                    value.parse().unwrap_or(defaults.background_check_interval_secs)
            }
            "refresh_window_start" => {
                app_settings.refresh_window_start = parse_time(value).unwrap_or(defaults.refresh_window_start)
            }
            "refresh_window_end" => {
                app_settings.refresh_window_end = parse_time(value).unwrap_or(defaults.refresh_window_end)
            }
            "refresh_max_attempts" => {
                app_settings.refresh_max_attempts = value.parse().unwrap_or(defaults.refresh_max_attempts)
            }
            "refresh_retry_delay_secs" => {
                app_settings.refresh_retry_delay_secs = value.parse().unwrap_or(defaults.refresh_retry_delay_secs)
            }
            "remote_collection" => app_settings.remote_collection = setting.value,
            other => warn!("Ignoring unknown setting '{}'", other),
        }
    }

    Ok(app_settings)
}

pub async fn update(pool: &SqlitePool, settings: &crate::models::Settings) -> Result<()> {
    let started = Instant::now();
    let lead_times_str = settings
        .lead_times_minutes
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let digest_hour_str = settings.digest_hour.to_string();
    let digest_horizon_str = settings.digest_horizon_days.to_string();
    let check_interval_str = settings.background_check_interval_secs.to_string();
    let window_start_str = settings.refresh_window_start.format(TIME_FORMAT).to_string();
    let window_end_str = settings.refresh_window_end.format(TIME_FORMAT).to_string();
    let max_attempts_str = settings.refresh_max_attempts.to_string();
    let retry_delay_str = settings.refresh_retry_delay_secs.to_string();

    let updates = vec![
        ("lead_times_minutes", lead_times_str.as_str()),
        ("digest_hour", digest_hour_str.as_str()),
        ("digest_horizon_days", digest_horizon_str.as_str()),
        ("timezone", settings.timezone.as_str()),
        ("background_check_interval_secs", check_interval_str.as_str()),
        ("refresh_window_start", window_start_str.as_str()),
        ("refresh_window_end", window_end_str.as_str()),
        ("refresh_max_attempts", max_attempts_str.as_str()),
        ("refresh_retry_delay_secs", retry_delay_str.as_str()),
        ("remote_collection", settings.remote_collection.as_str()),
    ];

    let mut tx = pool.begin().await?;
    for (key, value) in updates {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    log_database_operation("update", "settings", started.elapsed().as_millis() as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[tokio::test]
    async fn test_unparsable_values_fall_back_to_defaults() {
        let db = Database::in_memory().await.unwrap();
        for (key, value) in [("digest_hour", "late"), ("refresh_window_start", "1am"), ("lead_times_minutes", "")] {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&db.pool)
                .await
                .unwrap();
        }

        let settings = get(&db.pool).await.unwrap();
        let defaults = crate::models::Settings::default();
        assert_eq!(settings.digest_hour, defaults.digest_hour);
        assert_eq!(settings.refresh_window_start, defaults.refresh_window_start);
        assert_eq!(settings.lead_times_minutes, defaults.lead_times_minutes);
    }

    #[tokio::test]
    async fn test_window_round_trips_as_hh_mm() {
        let db = Database::in_memory().await.unwrap();
        let mut settings = crate::models::Settings::default();
        settings.refresh_window_start = NaiveTime::from_hms_opt(2, 15, 0).unwrap();
        update(&db.pool, &settings).await.unwrap();

        let (value,): (String,) = sqlx::query_as("SELECT value FROM settings WHERE key = 'refresh_window_start'")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(value, "02:15");
        assert_eq!(get(&db.pool).await.unwrap().refresh_window_start, settings.refresh_window_start);
    }
}
