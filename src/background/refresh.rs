//! Daily dataset refresh.
//!
//! Runs at most once per local calendar day, only inside the configured
//! early-morning window, and never twice at the same time.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::ScheduleReport;
use crate::notifications::{messages, NotificationService};
use crate::platform::{Connectivity, DatasetSource};
use crate::session::Session;
use crate::storage::keys;
use crate::utils::local_day_key;
use crate::utils::logging::log_scheduling_failure;
use crate::utils::retry::{retry_with_exponential_backoff, RetryConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    NotDue,
    /// Another refresh holds the lock.
    Busy,
    MissingCredentials,
    Refreshed(ScheduleReport),
}

pub struct DailyRefresh {
    session: Arc<Session>,
    notifications: Arc<NotificationService>,
    source: Arc<dyn DatasetSource>,
    connectivity: Arc<dyn Connectivity>,
    lock: Mutex<()>,
    retry: RetryConfig,
}

impl DailyRefresh {
    pub fn new(
        session: Arc<Session>,
        notifications: Arc<NotificationService>,
        source: Arc<dyn DatasetSource>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let settings = notifications.settings();
        let retry = RetryConfig::refresh(
            settings.refresh_max_attempts,
            Duration::from_secs(settings.refresh_retry_delay_secs),
        );
        Self {
            session,
            notifications,
            source,
            connectivity,
            lock: Mutex::new(()),
            retry,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Inside the refresh window and not yet run today.
    pub async fn is_time_to_run(&self) -> AppResult<bool> {
        let now = self.notifications.now();
        let tz = self.notifications.tz();
        let local_time = now.with_timezone(&tz).time();

        if !self.notifications.settings().in_refresh_window(local_time) {
            debug!("Refresh not due: {} is outside the window", local_time.format("%H:%M"));
            return Ok(false);
        }

        let today = local_day_key(now, tz);
        let last_run = self.notifications.store().get(keys::LAST_RUN_DATE).await?;
        let due = last_run.as_deref() != Some(today.as_str());
        info!("Refresh due: {}, last run: {:?}, today: {}", due, last_run, today);
        Ok(due)
    }

    pub async fn run_if_due(&self) -> AppResult<RefreshOutcome> {
        if !self.is_time_to_run().await? {
            return Ok(RefreshOutcome::NotDue);
        }
        self.run().await
    }

    /// Fetches, stores and reschedules, retrying transient failures.
    pub async fn run(&self) -> AppResult<RefreshOutcome> {
        let Ok(_guard) = self.lock.try_lock() else {
            info!("Refresh already in progress");
            return Ok(RefreshOutcome::Busy);
        };
        retry_with_exponential_backoff(&self.retry, || self.attempt()).await
    }

    async fn attempt(&self) -> AppResult<RefreshOutcome> {
        if !self.connectivity.is_reachable().await {
            warn!("Refresh attempt skipped: no internet connection");
            return Err(AppError::NetworkUnavailable);
        }

        let Some(credentials) = self.session.credentials().await? else {
            info!("Refresh stopped: missing credentials");
            if let Err(e) = self
                .notifications
                .send_immediate(messages::CREDENTIALS_TITLE, messages::CREDENTIALS_BODY)
                .await
            {
                log_scheduling_failure("credentials reminder", &e);
            }
            return Ok(RefreshOutcome::MissingCredentials);
        };

        let dataset = self.source.fetch(&credentials).await?;
        self.session.apply_dataset(&dataset).await?;
        let report = self.notifications.schedule_all_notifications().await?;

        if let Err(e) = self
            .notifications
            .send_immediate(messages::REFRESH_DONE_TITLE, messages::REFRESH_DONE_BODY)
            .await
        {
            log_scheduling_failure("refresh confirmation", &e);
        }
        info!("Daily refresh completed");
        Ok(RefreshOutcome::Refreshed(report))
    }
}
