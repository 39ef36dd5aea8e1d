// file: src/event.rs
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Class,
    Exam,
}

/// A class session or exam sitting, resolved to an absolute start time.
///
/// Events are rebuilt from the stored dataset on every scheduling pass and are
/// never persisted themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub kind: EventKind,
    pub name: String,
    pub room: String,
    pub start_time: DateTime<Utc>,
    pub seat_number: Option<String>,
    /// Where the event came from, e.g. `week:03/03/2024#2` or `exam:10/03/2024#0`.
    pub source_id: String,
}

impl ScheduleEvent {
    pub fn class(name: impl Into<String>, room: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Class,
            name: name.into(),
            room: room.into(),
            start_time,
            seat_number: None,
            source_id: String::new(),
        }
    }

    pub fn exam(
        name: impl Into<String>,
        room: impl Into<String>,
        start_time: DateTime<Utc>,
        seat_number: impl Into<String>,
    ) -> Self {
        Self {
            kind: EventKind::Exam,
            name: name.into(),
            room: room.into(),
            start_time,
            seat_number: Some(seat_number.into()),
            source_id: String::new(),
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    pub fn is_exam(&self) -> bool {
        self.kind == EventKind::Exam
    }

    /// Calendar day of the start time in the timetable's zone.
    pub fn date_key(&self, tz: Tz) -> NaiveDate {
        self.start_time.with_timezone(&tz).date_naive()
    }

    pub fn minutes_until_start(&self, now: DateTime<Utc>) -> i64 {
        (self.start_time - now).num_minutes()
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_event_date_key_uses_local_zone() {
        // 2024-03-10 23:30 in Hanoi is still 2024-03-10 16:30 UTC
        let tz: Tz = "Asia/Ho_Chi_Minh".parse().unwrap();
        let start = tz.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap().with_timezone(&Utc);
        let event = ScheduleEvent::class("CS101", "A101", start);
        assert_eq!(event.date_key(tz), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(event.date_key(chrono_tz::UTC), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_event_minutes_until_start() {
        let now = Utc::now();
        let event = ScheduleEvent::exam("Math", "B2", now + Duration::minutes(30), "042");
        assert_eq!(event.minutes_until_start(now), 30);
        assert!(!event.is_past(now));
        assert!(event.is_exam());
        assert_eq!(event.seat_number.as_deref(), Some("042"));
    }

    #[test]
    fn test_event_is_past() {
        let now = Utc::now();
        let event = ScheduleEvent::class("Physics", "C1", now - Duration::minutes(1));
        assert!(event.is_past(now));
    }
}
