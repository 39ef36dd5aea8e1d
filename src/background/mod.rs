//! Background work: keeping the OS task registered, the once-a-day dataset
//! refresh, and the loop that drives both.

pub mod monitor;
pub mod refresh;
pub mod watchdog;

/// Periodic fetch task kept alive by the registration watchdog.
pub const BACKGROUND_TASK: &str = "background-fetch-task";

/// Task that runs the daily portal refresh.
pub const REFRESH_TASK: &str = "background-fetch-task-api";

pub use monitor::{monitor_background, MonitorEvent};
pub use refresh::{DailyRefresh, RefreshOutcome};
pub use watchdog::{RegistrationWatchdog, WatchdogOutcome};
