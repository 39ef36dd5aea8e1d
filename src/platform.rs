//! Platform seams
//!
//! Everything the core needs from the host (notification delivery, local
//! persistence, the remote document store, connectivity, background task
//! registration and the school data endpoint) is reached through these traits.
//! SQLite and HTTP implementations live in `database` and `remote`; tests use
//! in-memory fakes or `mockall` mocks.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{Dataset, NotificationRequest};

/// Local notification delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Queues a notification. Returns the platform id, or `None` when the
    /// platform declined silently (e.g. permission denied).
    async fn schedule(&self, request: NotificationRequest) -> AppResult<Option<String>>;

    /// Drops every pending notification.
    async fn cancel_all(&self) -> AppResult<()>;
}

/// String-keyed local persistence with last-write-wins semantics.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    async fn remove_keys(&self, keys: &[String]) -> AppResult<()>;

    async fn all_keys(&self) -> AppResult<Vec<String>>;
}

/// Body of the per-user remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    #[serde(rename = "encryptedData")]
    pub encrypted_data: String,
}

#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    async fn fetch(&self, user_id: &str) -> AppResult<Option<RemoteDocument>>;

    async fn put(&self, user_id: &str, document: RemoteDocument) -> AppResult<()>;
}

#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// OS-level background task registration.
#[async_trait]
pub trait TaskRegistry: Send + Sync {
    /// Whether the platform currently allows background execution at all.
    async fn background_available(&self) -> AppResult<bool>;

    async fn is_registered(&self, task: &str) -> AppResult<bool>;

    async fn register(&self, task: &str, minimum_interval: Duration) -> AppResult<()>;

    async fn unregister(&self, task: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The school portal endpoint that produces a fresh timetable/exam payload.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self, credentials: &Credentials) -> AppResult<Dataset>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
