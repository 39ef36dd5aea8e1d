use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::background::{BACKGROUND_TASK, REFRESH_TASK};
use crate::error::AppResult;
use crate::platform::TaskRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    Healthy,
    Reregistered,
}

/// Re-registers the background fetch task when the platform has dropped it
/// or reports background execution as unavailable.
pub struct RegistrationWatchdog {
    registry: Arc<dyn TaskRegistry>,
    interval: Duration,
}

impl RegistrationWatchdog {
    pub fn new(registry: Arc<dyn TaskRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn check_and_reregister(&self) -> AppResult<WatchdogOutcome> {
        let available = self.registry.background_available().await?;
        let registered = self.registry.is_registered(BACKGROUND_TASK).await?;

        if available && registered {
            debug!("Background task {} is registered", BACKGROUND_TASK);
            return Ok(WatchdogOutcome::Healthy);
        }

        if !available {
            warn!("Background execution reported unavailable, re-registering {}", BACKGROUND_TASK);
        } else {
            info!("Background task {} not registered, registering", BACKGROUND_TASK);
        }
        self.registry.register(BACKGROUND_TASK, self.interval).await?;
        Ok(WatchdogOutcome::Reregistered)
    }

    /// Registers the refresh task once; an existing registration is left alone.
    pub async fn ensure_refresh_task(&self) -> AppResult<bool> {
        if self.registry.is_registered(REFRESH_TASK).await? {
            debug!("Refresh task already registered");
            return Ok(false);
        }
        self.registry.register(REFRESH_TASK, self.interval).await?;
        info!("Refresh task registered");
        Ok(true)
    }
}
