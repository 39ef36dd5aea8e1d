//! Date/time resolution for timetable rows.
//!
//! A class row names its week (`dd/mm/yyyy` start date), a weekday code and a
//! period range. The start instant is the first occurrence of that weekday on
//! or after the week start, at the wall-clock start of the first period.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::models::Period;

lazy_static! {
    static ref EXAM_SLOT: Regex = Regex::new(r"\(([^)]+)\)").unwrap();
}

/// Parses a `dd/mm/yyyy` date.
pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y")
        .map_err(|e| AppError::malformed_dataset(format!("Invalid date '{}': {}", value, e)))
}

/// Days after Sunday for a weekday code (`2`-`7` Monday-Saturday, `8` Sunday).
///
/// Code `1` is accepted as Sunday too, which is what the portal's own
/// arithmetic produces for it.
pub fn weekday_from_sunday(code: &str) -> AppResult<u32> {
    match code.trim().parse::<u32>() {
        Ok(8) => Ok(0),
        Ok(n @ 1..=7) => Ok(n - 1),
        _ => Err(AppError::malformed_dataset(format!("Invalid weekday code '{}'", code))),
    }
}

/// First period of a `"start --> end"` range.
pub fn first_period(range: &str) -> AppResult<Period> {
    let first = range.split("-->").next().unwrap_or_default().trim();
    first
        .parse::<u8>()
        .ok()
        .and_then(Period::get)
        .ok_or_else(|| AppError::malformed_dataset(format!("Invalid period range '{}'", range)))
}

/// Day offset from `week_start` to the target weekday, wrapped into `0..7`.
pub fn weekday_offset(week_start: NaiveDate, weekday_code: &str) -> AppResult<i64> {
    let target = weekday_from_sunday(weekday_code)? as i64;
    let start = week_start.weekday().num_days_from_sunday() as i64;
    let mut offset = target - start;
    if offset < 0 {
        offset += 7;
    }
    Ok(offset)
}

/// Attaches `tz` to a local wall-clock time.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> AppResult<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::malformed_dataset(format!("Local time {} does not exist in {}", naive, tz)))
}

pub fn resolve_class_start(
    week_start: &str,
    weekday_code: &str,
    period_range: &str,
    tz: Tz,
) -> AppResult<DateTime<Utc>> {
    let start_date = parse_date(week_start)?;
    let offset = weekday_offset(start_date, weekday_code)?;
    let period = first_period(period_range)?;
    let day = start_date + Duration::days(offset);
    localize(day.and_time(period.start), tz)
}

/// Start time of an exam slot such as `"Ca 1 (07:00-09:00)"`.
pub fn parse_exam_slot_start(slot: &str) -> AppResult<NaiveTime> {
    let inner = EXAM_SLOT
        .captures(slot)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| AppError::malformed_dataset(format!("Exam slot '{}' has no time range", slot)))?;
    let start = inner.split('-').next().unwrap_or_default().trim();
    NaiveTime::parse_from_str(start, "%H:%M")
        .map_err(|e| AppError::malformed_dataset(format!("Invalid exam start '{}': {}", start, e)))
}

pub fn resolve_exam_start(exam_date: &str, slot: &str, tz: Tz) -> AppResult<DateTime<Utc>> {
    let date = parse_date(exam_date)?;
    let time = parse_exam_slot_start(slot)?;
    localize(date.and_time(time), tz)
}
