pub mod logging;
pub mod retry;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Local calendar day of `now`, formatted the way `lastRunDate` is stored.
pub fn local_day_key(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).date_naive().format("%Y-%m-%d").to_string()
}

pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
