use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::NotificationRequest;
use crate::platform::Notifier;

/// A [`Notifier`] that keeps every request in memory.
///
/// Handy for hosts that deliver notifications themselves and for tests. The
/// `fail_every` knob makes every n-th call fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    requests: Mutex<Vec<NotificationRequest>>,
    cancel_calls: AtomicUsize,
    schedule_calls: AtomicUsize,
    fail_every: Option<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_every(n: usize) -> Self {
        Self {
            fail_every: Some(n.max(1)),
            ..Self::default()
        }
    }

    pub async fn requests(&self) -> Vec<NotificationRequest> {
        self.requests.lock().await.clone()
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn schedule(&self, request: NotificationRequest) -> AppResult<Option<String>> {
        let call = self.schedule_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(n) = self.fail_every {
            if call % n == 0 {
                return Err(AppError::scheduling(format!("rejected call #{}", call)));
            }
        }
        let mut requests = self.requests.lock().await;
        requests.push(request);
        Ok(Some(format!("recorded-{}", requests.len())))
    }

    async fn cancel_all(&self) -> AppResult<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.clear();
        Ok(())
    }
}
