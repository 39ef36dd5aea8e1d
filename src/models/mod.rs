// Declare modules
pub mod dataset;
pub mod digest;
pub mod event;
pub mod note;
pub mod notification;
pub mod period;
pub mod settings;
pub mod sync;

// Re-export so callers can write `use crate::models::ScheduleEvent`.
pub use dataset::{ClassEntry, Dataset, ExamEntry, WeekSchedule};
pub use digest::DailyDigestEntry;
pub use event::{EventKind, ScheduleEvent};
pub use note::Note;
pub use notification::{seconds_until, NotificationPriority, NotificationRequest, PendingNotification};
pub use period::Period;
pub use settings::{Setting, Settings};
pub use sync::{NoteSyncOutcome, RemoteSyncState, ScheduleReport};
