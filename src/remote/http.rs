//! reqwest-backed adapters for the remote document store, the reachability
//! probe and the school portal dataset endpoint.

use std::time::Instant;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::Dataset;
use crate::platform::{Connectivity, Credentials, DatasetSource, RemoteDocument, RemoteDocumentStore};
use crate::remote::HttpConfig;
use crate::utils::logging::log_network_error;
use crate::utils::retry::{retry_with_exponential_backoff, RetryConfig};

/// Checks that an endpoint is an absolute http(s) URL with a host.
pub fn validate_endpoint(endpoint: &str) -> AppResult<Url> {
    if endpoint.trim().is_empty() {
        return Err(AppError::config("endpoint URL cannot be empty"));
    }
    let url = Url::parse(endpoint).map_err(|e| AppError::config(format!("invalid endpoint URL '{}': {}", endpoint, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::config(format!(
            "endpoint must use http or https, got '{}://'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AppError::config(format!("endpoint '{}' has no host", endpoint)));
    }
    if url.scheme() == "http" {
        warn!("Endpoint {} is not using HTTPS", endpoint);
    }
    Ok(url)
}

/// One JSON document per user at `{base}/{collection}/{user}`.
pub struct HttpDocumentStore {
    client: Client,
    base: Url,
    collection: String,
    retry: RetryConfig,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, collection: &str) -> AppResult<Self> {
        let config = HttpConfig::document_store();
        Ok(Self {
            client: config.build_client()?,
            base: validate_endpoint(base_url)?,
            collection: collection.to_string(),
            retry: config.to_retry_config(),
        })
    }

    pub fn document_url(&self, user_id: &str) -> AppResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::config("document store URL cannot be a base"))?
            .pop_if_empty()
            .push(&self.collection)
            .push(user_id);
        Ok(url)
    }

    async fn fetch_once(&self, url: &Url) -> AppResult<Option<RemoteDocument>> {
        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<RemoteDocument>().await?)),
            status => match response.error_for_status() {
                Err(e) => Err(AppError::Network(e)),
                Ok(_) => Err(AppError::operation_failed(format!("document fetch returned {}", status))),
            },
        }
    }

    async fn put_once(&self, url: &Url, document: &RemoteDocument) -> AppResult<()> {
        self.client
            .put(url.clone())
            .json(document)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl RemoteDocumentStore for HttpDocumentStore {
    async fn fetch(&self, user_id: &str) -> AppResult<Option<RemoteDocument>> {
        let url = self.document_url(user_id)?;
        debug!("Fetching remote document for {}", user_id);
        retry_with_exponential_backoff(&self.retry, || self.fetch_once(&url))
            .await
            .map_err(|e| {
                log_network_error("fetch remote document", &e);
                e
            })
    }

    async fn put(&self, user_id: &str, document: RemoteDocument) -> AppResult<()> {
        let url = self.document_url(user_id)?;
        debug!("Uploading remote document for {}", user_id);
        retry_with_exponential_backoff(&self.retry, || self.put_once(&url, &document))
            .await
            .map_err(|e| {
                log_network_error("upload remote document", &e);
                e
            })
    }
}

/// Reachability probe: any HTTP answer from the probe URL counts as online.
pub struct HttpConnectivity {
    client: Client,
    probe: Url,
}

impl HttpConnectivity {
    pub fn new(probe_url: &str) -> AppResult<Self> {
        Ok(Self {
            client: HttpConfig::probe().build_client()?,
            probe: validate_endpoint(probe_url)?,
        })
    }
}

#[async_trait]
impl Connectivity for HttpConnectivity {
    async fn is_reachable(&self) -> bool {
        match self.client.head(self.probe.clone()).send().await {
            Ok(response) => {
                debug!("Reachability probe answered {}", response.status());
                true
            }
            Err(e) => {
                debug!("Reachability probe failed: {}", e);
                false
            }
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// The school portal endpoint returning `{thoikhoabieu, lichthi}`.
pub struct HttpDatasetSource {
    client: Client,
    endpoint: Url,
    retry: RetryConfig,
}

impl HttpDatasetSource {
    pub fn new(endpoint: &str) -> AppResult<Self> {
        let config = HttpConfig::dataset_fetch();
        Ok(Self {
            client: config.build_client()?,
            endpoint: validate_endpoint(endpoint)?,
            retry: config.to_retry_config(),
        })
    }

    async fn fetch_once(&self, credentials: &Credentials) -> AppResult<Dataset> {
        let body = LoginBody {
            username: &credentials.username,
            password: &credentials.password,
        };
        let response = self.client.post(self.endpoint.clone()).json(&body).send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::permission_denied("portal rejected the stored credentials"))
            }
            status if !status.is_success() => Err(AppError::Anyhow(anyhow!("dataset request failed: {}", status))),
            _ => {
                let text = response.text().await?;
                let dataset = serde_json::from_str::<Dataset>(&text)
                    .context("portal returned an unexpected payload")
                    .map_err(|e| AppError::malformed_dataset(format!("{:#}", e)))?;
                Ok(dataset)
            }
        }
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self, credentials: &Credentials) -> AppResult<Dataset> {
        let started = Instant::now();
        let dataset = retry_with_exponential_backoff(&self.retry, || self.fetch_once(credentials)).await?;
        info!("Fetched dataset in {} ms", started.elapsed().as_millis());
        Ok(dataset)
    }
}
