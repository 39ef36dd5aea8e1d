use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;

use crate::background::{RefreshOutcome, WatchdogOutcome};
use crate::error::AppResult;
use crate::models::{PendingNotification, ScheduleReport};
use crate::AppState;

#[derive(Debug, Clone)]
pub enum MonitorEvent {
    NotificationDue(PendingNotification),
    WatchdogChecked(WatchdogOutcome),
    RefreshCompleted(ScheduleReport),
    Error(String),
}

pub async fn monitor_background(state: Arc<AppState>, sender: Option<Sender<MonitorEvent>>) {
    info!("Starting background monitor loop");

    let mut last_watchdog: Option<Instant> = None;

    loop {
        if state.shutdown.is_cancelled() {
            info!("Shutdown signal received, stopping monitor loop");
            break;
        }

        if let Err(e) = monitor_cycle(&state, &mut last_watchdog, &sender).await {
            error!("Error in monitor cycle: {}", e);
            if let Some(tx) = &sender {
                let _ = tx.send(MonitorEvent::Error(e.to_safe_string())).await;
            }
        }

        tokio::select! {
            _ = sleep(state.poll_interval) => {}
            _ = state.shutdown.cancelled() => {
                info!("Shutdown signal received during sleep, stopping monitor loop");
                break;
            }
        }
    }

    info!("Background monitor loop stopped gracefully");
}

async fn monitor_cycle(
    state: &Arc<AppState>,
    last_watchdog: &mut Option<Instant>,
    sender: &Option<Sender<MonitorEvent>>,
) -> AppResult<()> {
    deliver_due(state, sender).await?;

    if let Some(watchdog) = &state.watchdog {
        let due = last_watchdog.map_or(true, |at| at.elapsed() >= watchdog.interval());
        if due {
            *last_watchdog = Some(Instant::now());
            match watchdog.check_and_reregister().await {
                Ok(outcome) => {
                    if let Some(tx) = sender {
                        let _ = tx.send(MonitorEvent::WatchdogChecked(outcome)).await;
                    }
                }
                Err(e) => warn!("Background registration check failed: {}", e),
            }
        }
    }

    spawn_refresh(state, sender.clone());
    Ok(())
}

/// How late, in minutes, a queued notification may still be shown.
pub const DELIVERY_GRACE_MINUTES: i64 = 30;

/// Emits every queued notification whose time has come and marks it
/// delivered. Entries more than `DELIVERY_GRACE_MINUTES` overdue are retired
/// without being emitted.
pub async fn deliver_due(state: &AppState, sender: &Option<Sender<MonitorEvent>>) -> AppResult<usize> {
    let now = state.notifications.now();
    let grace = chrono::Duration::minutes(DELIVERY_GRACE_MINUTES);
    let due = state.queue.due(now).await?;
    let mut count = 0;
    for pending in due {
        let id = pending.id.clone();
        let stale = pending.fire_time().map_or(false, |at| now - at > grace);
        if stale {
            info!("Dropping stale notification {}: {}", pending.id, pending.title);
        } else {
            info!("Delivering notification {}: {}", pending.id, pending.title);
            if let Some(tx) = sender {
                let _ = tx.send(MonitorEvent::NotificationDue(pending)).await;
            }
            count += 1;
        }
        state.queue.mark_delivered(&id).await?;
    }
    if count > 0 {
        debug!("Delivered {} notifications", count);
    }
    Ok(count)
}

/// Runs the daily refresh off the loop; its own lock keeps it single-flight.
fn spawn_refresh(state: &Arc<AppState>, sender: Option<Sender<MonitorEvent>>) {
    let Some(refresh) = state.refresh.clone() else {
        return;
    };
    tokio::spawn(async move {
        match refresh.run_if_due().await {
            Ok(RefreshOutcome::Refreshed(report)) => {
                if let Some(tx) = &sender {
                    let _ = tx.send(MonitorEvent::RefreshCompleted(report)).await;
                }
            }
            Ok(outcome) => debug!("Refresh check finished: {:?}", outcome),
            Err(e) => {
                error!("Daily refresh failed: {}", e);
                if let Some(tx) = &sender {
                    let _ = tx.send(MonitorEvent::Error(e.to_safe_string())).await;
                }
            }
        }
    });
}

/// App-foreground hook: re-check the task registration, refresh if due and
/// sync notes.
pub async fn on_foreground(state: Arc<AppState>, sender: Option<Sender<MonitorEvent>>) {
    if let Some(watchdog) = &state.watchdog {
        if let Err(e) = watchdog.check_and_reregister().await {
            warn!("Background registration check failed: {}", e);
        }
    }
    spawn_refresh(&state, sender);
    if let Some(note_sync) = &state.note_sync {
        if let Err(e) = note_sync.sync_remote_notes().await {
            warn!("Note sync on foreground failed: {}", e.to_safe_string());
        }
    }
}
