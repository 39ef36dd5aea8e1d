//! In-process stand-ins for the remote adapters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::Dataset;
use crate::platform::{Connectivity, Credentials, DatasetSource, RemoteDocument, RemoteDocumentStore};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, RemoteDocument>>,
    puts: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: &str, document: RemoteDocument) {
        self.documents.write().await.insert(user_id.to_string(), document);
    }

    pub async fn document(&self, user_id: &str) -> Option<RemoteDocument> {
        self.documents.read().await.get(user_id).cloned()
    }

    /// Number of uploads since creation.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteDocumentStore for MemoryDocumentStore {
    async fn fetch(&self, user_id: &str) -> AppResult<Option<RemoteDocument>> {
        Ok(self.document(user_id).await)
    }

    async fn put(&self, user_id: &str, document: RemoteDocument) -> AppResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.insert(user_id, document).await;
        Ok(())
    }
}

#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for StaticConnectivity {
    async fn is_reachable(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Serves a fixed dataset, optionally failing the first `failures` calls.
#[derive(Debug)]
pub struct StaticDatasetSource {
    dataset: Dataset,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl StaticDatasetSource {
    pub fn new(dataset: Dataset) -> Self {
        Self::failing_first(dataset, 0)
    }

    pub fn failing_first(dataset: Dataset, failures: usize) -> Self {
        Self {
            dataset,
            failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetSource for StaticDatasetSource {
    async fn fetch(&self, _credentials: &Credentials) -> AppResult<Dataset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::NetworkUnavailable);
        }
        Ok(self.dataset.clone())
    }
}
