// classchime library
// Class/exam reminder scheduling, daily digests and encrypted note sync.

pub mod background;
pub mod calendar;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod notifications;
pub mod platform;
pub mod remote;
pub mod session;
pub mod storage;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use background::{monitor_background, MonitorEvent};
pub use database::{Database, SqliteNotifier, SqliteStore};
pub use error::{AppError, AppResult};
pub use models::*;
pub use notifications::NotificationService;
pub use session::Session;
pub use sync::NoteSync;

use std::sync::Arc;
use std::time::Duration;

/// State shared by the background monitor and foreground hooks.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<SqliteNotifier>,
    pub notifications: Arc<NotificationService>,
    pub watchdog: Option<Arc<background::RegistrationWatchdog>>,
    pub refresh: Option<Arc<background::DailyRefresh>>,
    pub note_sync: Option<Arc<NoteSync>>,
    pub poll_interval: Duration,
    pub shutdown: tokio_util::sync::CancellationToken,
}
