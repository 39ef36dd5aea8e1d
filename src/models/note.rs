// file: src/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user note; only the fields the reminder pass needs are typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// RFC 3339 timestamp of the reminder.
    #[serde(default)]
    pub date: String,
    #[serde(rename = "showNotification", default)]
    pub show_notification: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Note {
    pub fn remind_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_keeps_unknown_fields() {
        let note: Note = serde_json::from_str(
            r#"{"id": 7, "title": "Buy ink", "content": "", "date": "2024-03-10T08:00:00+07:00", "showNotification": true}"#,
        )
        .unwrap();
        assert!(note.show_notification);
        assert_eq!(note.extra.get("id"), Some(&serde_json::json!(7)));
        assert_eq!(note.remind_at().unwrap().to_rfc3339(), "2024-03-10T01:00:00+00:00");
    }

    #[test]
    fn test_note_with_bad_date() {
        let note: Note = serde_json::from_str(r#"{"title": "x", "date": "tomorrow"}"#).unwrap();
        assert!(note.remind_at().is_none());
        assert!(!note.show_notification);
    }
}
