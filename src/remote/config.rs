//! HTTP client configuration for the remote adapters.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::AppResult;
use crate::utils::retry::RetryConfig;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Total request timeout
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub base_retry_delay: Duration,
    pub max_retry_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(45),
            max_retries: 3,
            base_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl HttpConfig {
    /// Settings for the note document store.
    pub fn document_store() -> Self {
        Self::default()
    }

    /// The school portal can be slow to assemble a full timetable.
    pub fn dataset_fetch() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            timeout: Duration::from_secs(120),
            max_retries: 2,
            base_retry_delay: Duration::from_millis(2000),
            max_retry_delay: Duration::from_secs(30),
            backoff_multiplier: 1.5,
        }
    }

    /// Reachability probes should answer quickly or not at all.
    pub fn probe() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(8),
            max_retries: 1,
            base_retry_delay: Duration::from_millis(250),
            max_retry_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }

    pub fn build_client(&self) -> AppResult<Client> {
        Ok(ClientBuilder::new()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .build()?)
    }

    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retries,
            base_delay: self.base_retry_delay,
            max_delay: self.max_retry_delay,
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}
