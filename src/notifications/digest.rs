//! "What's tomorrow" digest planning.
//!
//! One reminder per day over the horizon, fired at `digest_hour` local time on
//! the previous evening. Days with events report the count (and exam details);
//! empty days get a random filler message.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use log::warn;
use rand::RngCore;

use super::messages;
use crate::calendar::resolver::localize;
use crate::error::AppResult;
use crate::models::{seconds_until, DailyDigestEntry, NotificationRequest, ScheduleEvent};

#[derive(Debug, Clone, Copy)]
pub struct DigestPlan {
    pub horizon_days: u32,
    pub digest_hour: u32,
    pub tz: Tz,
}

/// Groups events by local calendar day.
pub fn group_by_day<'a>(events: &'a [ScheduleEvent], tz: Tz) -> BTreeMap<NaiveDate, Vec<&'a ScheduleEvent>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&ScheduleEvent>> = BTreeMap::new();
    for event in events {
        by_day.entry(event.date_key(tz)).or_default().push(event);
    }
    by_day
}

fn digest_message(day_events: &[&ScheduleEvent], tz: Tz) -> String {
    let mut message = messages::digest_count_message(day_events.len());
    for exam in day_events.iter().filter(|e| e.is_exam()) {
        message.push(' ');
        message.push_str(&messages::digest_exam_line(
            &exam.name,
            exam.start_time.with_timezone(&tz).time(),
            &exam.room,
            exam.seat_number.as_deref().unwrap_or_default(),
        ));
    }
    message
}

/// Plans the digests for days `today+1 ..= today+horizon`. Days whose eve
/// firing time is not strictly after `now`, or does not exist in the zone,
/// are left out.
pub fn plan_digests(
    events: &[ScheduleEvent],
    now: DateTime<Utc>,
    plan: DigestPlan,
    rng: &mut dyn RngCore,
) -> AppResult<Vec<DailyDigestEntry>> {
    let by_day = group_by_day(events, plan.tz);
    let today = now.with_timezone(&plan.tz).date_naive();
    let fire_time = NaiveTime::from_hms_opt(plan.digest_hour, 0, 0)
        .ok_or_else(|| crate::error::AppError::config(format!("Invalid digest hour {}", plan.digest_hour)))?;

    let mut entries = Vec::new();
    for i in 1..=plan.horizon_days as i64 {
        let day = today + Duration::days(i);
        let fire_at = match localize((day - Duration::days(1)).and_time(fire_time), plan.tz) {
            Ok(at) => at,
            Err(e) => {
                warn!("Skipping digest for {}: {}", day, e);
                continue;
            }
        };
        if fire_at <= now {
            continue;
        }

        let (event_count, message) = match by_day.get(&day) {
            Some(day_events) if !day_events.is_empty() => (day_events.len(), digest_message(day_events, plan.tz)),
            _ => (0, messages::pick_filler(rng)),
        };
        entries.push(DailyDigestEntry {
            date: day,
            event_count,
            message,
            fire_at,
        });
    }
    Ok(entries)
}

/// The request for a planned digest, or `None` if its time has passed by now.
pub fn digest_request(entry: &DailyDigestEntry, now: DateTime<Utc>) -> Option<NotificationRequest> {
    let offset = seconds_until(entry.fire_at, now)?;
    Some(NotificationRequest::scheduled(messages::DIGEST_TITLE, entry.message.clone(), offset))
}
