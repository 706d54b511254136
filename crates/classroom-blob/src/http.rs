//! HTTP object gateway client.
//!
//! The gateway fronts the media bucket and exposes a bulk-delete endpoint:
//!
//! ```text
//! POST {base_url}/v1/buckets/{bucket}/delete
//! { "keys": ["videos/...", ...] }
//!
//! 200 OK
//! { "deleted": ["videos/..."], "errors": [{ "key": "...", "code": "...", "message": "..." }] }
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{BlobError, Result};
use crate::{check_batch, BlobStore, BulkDeleteOutcome, KeyFailure, DEFAULT_MAX_BATCH_SIZE};

#[derive(Debug, Serialize)]
struct BulkDeleteRequest<'a> {
    keys: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GatewayErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Options for the HTTP blob store.
#[derive(Debug, Clone)]
pub struct HttpBlobStoreOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Maximum keys per request (default: 1000).
    pub max_batch_size: usize,
}

impl Default for HttpBlobStoreOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Blob store reached through an HTTP object gateway.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    bucket: String,
    token: Option<String>,
    max_batch_size: usize,
}

impl HttpBlobStore {
    /// Create a gateway client with default options.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Gateway URL (e.g., `"http://blob-gateway:9000"`)
    /// * `bucket` - Bucket holding the media objects
    /// * `token` - Optional bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self> {
        Self::with_options(base_url, bucket, token, HttpBlobStoreOptions::default())
    }

    /// Create a gateway client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the options are
    /// invalid.
    pub fn with_options(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        token: Option<String>,
        options: HttpBlobStoreOptions,
    ) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(BlobError::Configuration("bucket name is empty".into()));
        }
        if options.max_batch_size == 0 {
            return Err(BlobError::Configuration(
                "max_batch_size must be at least 1".into(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| BlobError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket,
            token,
            max_batch_size: options.max_batch_size,
        })
    }

    /// Handle a bulk-delete response.
    async fn handle_response(
        response: reqwest::Response,
        requested: &[String],
    ) -> Result<BulkDeleteOutcome> {
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<GatewayErrorResponse>().await {
                Ok(body) => body
                    .message
                    .or(body.error)
                    .unwrap_or_else(|| format!("HTTP {status}")),
                Err(_) => format!("HTTP {status}"),
            };
            return Err(BlobError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: BulkDeleteOutcome = response.json().await?;
        Ok(Self::reconcile(requested, reply))
    }

    /// Fit a gateway reply to the keys actually requested.
    ///
    /// Each requested key lands in exactly one list, and a reported failure
    /// wins over a reported deletion. Keys the gateway did not mention are
    /// not known to be gone. Keys nobody asked for are dropped.
    fn reconcile(requested: &[String], reply: BulkDeleteOutcome) -> BulkDeleteOutcome {
        let deleted: HashSet<String> = reply.deleted.into_iter().collect();
        let mut failures: HashMap<String, KeyFailure> = HashMap::new();
        for failure in reply.failed {
            failures.entry(failure.key.clone()).or_insert(failure);
        }

        let mut outcome = BulkDeleteOutcome::default();
        let mut seen = HashSet::new();
        for key in requested {
            if !seen.insert(key.as_str()) {
                continue;
            }
            if let Some(failure) = failures.remove(key) {
                outcome.failed.push(failure);
            } else if deleted.contains(key) {
                outcome.deleted.push(key.clone());
            } else {
                outcome.failed.push(KeyFailure::new(
                    key.clone(),
                    "Unreported",
                    "key missing from gateway response",
                ));
            }
        }
        outcome
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<BulkDeleteOutcome> {
        if keys.is_empty() {
            return Ok(BulkDeleteOutcome::default());
        }
        check_batch(keys, self.max_batch_size)?;

        let url = format!(
            "{}/v1/buckets/{}/delete",
            self.base_url,
            urlencoding::encode(&self.bucket)
        );

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&BulkDeleteRequest { keys });
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let outcome = Self::handle_response(response, keys).await?;

        tracing::debug!(
            bucket = %self.bucket,
            requested = keys.len(),
            deleted = outcome.deleted.len(),
            failed = outcome.failed.len(),
            "Bulk delete request completed"
        );

        Ok(outcome)
    }
}
