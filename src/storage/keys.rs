// Local storage keys shared with the app's screens.

pub const TIMETABLE: &str = "userData_ThoiKhoaBieu";
pub const EXAMS: &str = "userData_LichThi";
pub const NOTES: &str = "userGhiChu";

/// Schedule gate record (see `notifications::gate`).
pub const SCHEDULE_GATE: &str = "scheduledNotifications";
pub const NOTIFICATIONS_SCHEDULED: &str = "notificationsScheduled";
pub const SYNC_NOTES_STATUS: &str = "SyncGhiChuStatus";

pub const LAST_RUN_DATE: &str = "lastRunDate";
pub const LAST_UPDATE: &str = "lastUpdate";
pub const ENCRYPTION_KEY: &str = "user_encryption_key";

pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const LOGGED_IN: &str = "isLoggedIn";

/// Keys that survive a logout.
pub const KEEP_ON_LOGOUT: &[&str] = &[
    "@battery_optimization_checked",
    "@intro_completed",
    "AppLogs",
    "expoPushToken",
    ENCRYPTION_KEY,
    "firstTime_v2.5.stable",
];
