//! Blob storage client for encrypted CipherDrop payloads.
//!
//! Uploads go to a publisher endpoint as raw bytes and come back with a
//! blob id; downloads go to an aggregator endpoint by blob id. The store
//! only ever sees ciphertext, so it needs no credentials beyond the
//! endpoints themselves.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

// =============================================================================
// Errors
// =============================================================================

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("blob store API error: {0}")]
    Api(String),

    /// No blob with the requested id.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The store answered 2xx but the body named no blob id.
    #[error("unexpected blob store response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// =============================================================================
// Configuration
// =============================================================================

/// Endpoints and defaults for the blob store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// Write endpoint; uploads are `PUT {publisher_url}/v1/blobs`.
    pub publisher_url: String,
    /// Read endpoint; downloads are `GET {aggregator_url}/v1/blobs/{id}`.
    pub aggregator_url: String,
    /// Storage epochs requested per upload.
    pub default_epochs: u32,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            publisher_url: "https://publisher.walrus-testnet.walrus.space".to_string(),
            aggregator_url: "https://aggregator.walrus-testnet.walrus.space".to_string(),
            default_epochs: 1,
        }
    }
}

// =============================================================================
// Types
// =============================================================================

/// Receipt for an uploaded blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    /// Id to hand to the recipient for download.
    pub blob_id: String,
    /// The store already held identical content and kept its existing blob.
    pub already_certified: bool,
    /// Uploaded size in bytes.
    pub size: u64,
}

/// A downloaded blob with the content type the store echoed back.
#[derive(Clone, Debug)]
pub struct BlobDownload {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

// Upload responses name the blob id under one of two keys, depending on
// whether the content was new to the store.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutResponse {
    newly_created: Option<NewlyCreated>,
    already_certified: Option<AlreadyCertified>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewlyCreated {
    blob_object: BlobObject,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobObject {
    blob_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyCertified {
    blob_id: String,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the publisher/aggregator pair.
pub struct BlobStoreClient {
    http: Client,
    config: BlobStoreConfig,
}

impl BlobStoreClient {
    pub fn new(config: BlobStoreConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self { http, config }
    }

    pub fn config(&self) -> &BlobStoreConfig {
        &self.config
    }

    /// Uploads raw bytes for the configured number of epochs.
    pub async fn store(&self, data: &[u8]) -> StoreResult<StoredBlob> {
        self.store_with_epochs(data, self.config.default_epochs).await
    }

    /// Uploads raw bytes, requesting storage for `epochs` epochs.
    pub async fn store_with_epochs(&self, data: &[u8], epochs: u32) -> StoreResult<StoredBlob> {
        let url = format!("{}/v1/blobs?epochs={epochs}", self.config.publisher_url);
        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api(format!("upload returned {status}: {body}")));
        }

        let body: PutResponse = resp.json().await?;
        let (blob_id, already_certified) = if let Some(created) = body.newly_created {
            (created.blob_object.blob_id, false)
        } else if let Some(existing) = body.already_certified {
            (existing.blob_id, true)
        } else {
            return Err(StoreError::UnexpectedResponse(
                "upload response names no blob id".to_string(),
            ));
        };

        debug!(
            "stored {} bytes as blob {blob_id} (already certified: {already_certified})",
            data.len()
        );
        Ok(StoredBlob {
            blob_id,
            already_certified,
            size: data.len() as u64,
        })
    }

    /// Downloads a blob by id.
    pub async fn fetch(&self, blob_id: &str) -> StoreResult<BlobDownload> {
        let url = format!("{}/v1/blobs/{blob_id}", self.config.aggregator_url);
        let resp = self.http.get(url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(blob_id.to_string()));
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api(format!("download returned {status}: {body}")));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let data = resp.bytes().await?.to_vec();

        debug!("fetched blob {blob_id}, {} bytes", data.len());
        Ok(BlobDownload { data, content_type })
    }
}
