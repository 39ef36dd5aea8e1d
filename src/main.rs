// classchime - headless reminder host
// Keeps the notification queue draining and runs the daily refresh and note
// sync against configured endpoints.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use classchime::background::{monitor, DailyRefresh, MonitorEvent};
use classchime::config::validate_settings;
use classchime::platform::{Connectivity, DatasetSource, KeyValueStore, Notifier, RemoteDocumentStore};
use classchime::remote::{HttpConnectivity, HttpDatasetSource, HttpDocumentStore};
use classchime::utils::logging::{init_logging, log_error_with_context};
use classchime::utils::retry::RetryConfig;
use classchime::{AppState, Database, NoteSync, NotificationService, Session};

const SYNC_URL_ENV: &str = "CLASSCHIME_SYNC_URL";
const PORTAL_URL_ENV: &str = "CLASSCHIME_PORTAL_URL";
const PROBE_URL_ENV: &str = "CLASSCHIME_PROBE_URL";
const DEFAULT_PROBE_URL: &str = "https://clients3.google.com/generate_204";

const POLL_INTERVAL: Duration = Duration::from_secs(30);

fn env_url(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting classchime");

    let db = match Database::new().await {
        Ok(database) => Arc::new(database),
        Err(e) => {
            log_error_with_context(&e, "database");
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let settings = db.get_settings().await?.from_env_overrides();
    validate_settings(&settings)?;
    let tz = settings.tz()?;

    let store: Arc<dyn KeyValueStore> = Arc::new(db.store());
    let queue = Arc::new(db.notifier());
    let notifier: Arc<dyn Notifier> = queue.clone();
    let notifications = Arc::new(NotificationService::new(notifier.clone(), store.clone(), settings.clone())?);
    let session = Arc::new(Session::new(store.clone(), notifier, tz));

    let connectivity: Option<Arc<dyn Connectivity>> = match HttpConnectivity::new(
        &env_url(PROBE_URL_ENV).unwrap_or_else(|| DEFAULT_PROBE_URL.to_string()),
    ) {
        Ok(probe) => Some(Arc::new(probe)),
        Err(e) => {
            warn!("Connectivity probe disabled: {}", e);
            None
        }
    };

    let refresh = match (env_url(PORTAL_URL_ENV), &connectivity) {
        (Some(url), Some(connectivity)) => {
            let source: Arc<dyn DatasetSource> = Arc::new(HttpDatasetSource::new(&url)?);
            Some(Arc::new(DailyRefresh::new(
                session.clone(),
                notifications.clone(),
                source,
                connectivity.clone(),
            )))
        }
        _ => {
            info!("{} not set, daily refresh disabled", PORTAL_URL_ENV);
            None
        }
    };

    let note_sync = match (env_url(SYNC_URL_ENV), &connectivity) {
        (Some(url), Some(connectivity)) => {
            let remote: Arc<dyn RemoteDocumentStore> =
                Arc::new(HttpDocumentStore::new(&url, &settings.remote_collection)?);
            Some(Arc::new(NoteSync::new(
                store.clone(),
                remote,
                connectivity.clone(),
                notifications.clone(),
            )))
        }
        _ => {
            info!("{} not set, note sync disabled", SYNC_URL_ENV);
            None
        }
    };

    if let Err(e) = notifications.schedule_all_with_retry(&RetryConfig::default()).await {
        error!("Initial scheduling pass failed: {}", e.to_safe_string());
    }

    let state = Arc::new(AppState {
        queue,
        notifications,
        watchdog: None,
        refresh,
        note_sync,
        poll_interval: POLL_INTERVAL,
        shutdown: CancellationToken::new(),
    });

    let (tx, mut rx) = mpsc::channel::<MonitorEvent>(64);
    monitor::on_foreground(state.clone(), Some(tx.clone())).await;
    let monitor_handle = tokio::spawn(monitor::monitor_background(state.clone(), Some(tx)));

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                MonitorEvent::NotificationDue(pending) => {
                    println!("[{}] {}\n{}", pending.channel.as_deref().unwrap_or("-"), pending.title, pending.body)
                }
                MonitorEvent::RefreshCompleted(report) => {
                    info!("Refresh scheduled {} notifications", report.total_requests())
                }
                MonitorEvent::WatchdogChecked(outcome) => info!("Watchdog: {:?}", outcome),
                MonitorEvent::Error(message) => warn!("Monitor error: {}", message),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");
    state.shutdown.cancel();

    if let Err(e) = monitor_handle.await {
        error!("Monitor task ended abnormally: {}", e);
    }
    printer.abort();

    info!("classchime stopped");
    Ok(())
}
