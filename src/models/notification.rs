// file: src/notification.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Delivery channel used for every request the core issues.
pub const DEFAULT_CHANNEL: &str = "notification-tkb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Default,
    #[default]
    Max,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Max => "max",
        }
    }

    /// Unknown values read back as `Max`.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "default" => Self::Default,
            _ => Self::Max,
        }
    }
}

/// A request for platform-level delivery.
///
/// `trigger_seconds` is the offset from "now"; `None` means deliver immediately.
/// Scheduled (non-immediate) offsets are always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub trigger_seconds: Option<u64>,
    pub channel: Option<String>,
    pub priority: NotificationPriority,
}

impl NotificationRequest {
    pub fn scheduled(title: impl Into<String>, body: impl Into<String>, seconds_from_now: u64) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            trigger_seconds: Some(seconds_from_now),
            channel: Some(DEFAULT_CHANNEL.to_string()),
            priority: NotificationPriority::Max,
        }
    }

    pub fn immediate(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            trigger_seconds: None,
            channel: Some(DEFAULT_CHANNEL.to_string()),
            priority: NotificationPriority::Max,
        }
    }

    pub fn is_immediate(&self) -> bool {
        self.trigger_seconds.is_none()
    }

    /// Absolute firing time relative to `now`.
    pub fn fire_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.trigger_seconds {
            Some(secs) => now + chrono::Duration::seconds(secs as i64),
            None => now,
        }
    }
}

/// A queued request as stored by the SQLite notifier.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PendingNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub channel: Option<String>,
    pub priority: String,
    /// Unix seconds.
    pub fire_at: i64,
    pub delivered: bool,
}

impl PendingNotification {
    pub fn fire_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.fire_at, 0).single()
    }

    pub fn priority(&self) -> NotificationPriority {
        NotificationPriority::from_stored(&self.priority)
    }
}

/// Whole seconds from `now` until `trigger`, or `None` when the trigger is not
/// strictly in the future.
pub fn seconds_until(trigger: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let secs = (trigger - now).num_seconds();
    if secs > 0 {
        Some(secs as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_seconds_until_future_and_past() {
        let now = Utc::now();
        assert_eq!(seconds_until(now + Duration::seconds(90), now), Some(90));
        assert_eq!(seconds_until(now, now), None);
        assert_eq!(seconds_until(now - Duration::seconds(5), now), None);
        assert_eq!(seconds_until(now + Duration::milliseconds(400), now), None);
    }

    #[test]
    fn test_immediate_request_fires_now() {
        let now = Utc::now();
        let request = NotificationRequest::immediate("Hello", "World");
        assert!(request.is_immediate());
        assert_eq!(request.fire_at(now), now);
        assert_eq!(request.channel.as_deref(), Some(DEFAULT_CHANNEL));
    }

    #[test]
    fn test_scheduled_request_fire_at() {
        let now = Utc::now();
        let request = NotificationRequest::scheduled("Hello", "World", 600);
        assert_eq!(request.fire_at(now), now + Duration::seconds(600));
    }
}
