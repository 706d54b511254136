//! Application state.

use std::path::Path;
use std::sync::Arc;

use classroom_blob::{BlobError, BlobStore, FsBlobStore, HttpBlobStore, MemoryBlobStore};
use classroom_cascade::CascadeEngine;

use crate::config::{BlobBackend, ServiceConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The deletion engine.
    pub engine: Arc<CascadeEngine>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(engine: Arc<CascadeEngine>, config: ServiceConfig) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not set - all cascade endpoints will reject requests");
        }
        Self { engine, config }
    }
}

/// Build the configured blob store.
///
/// # Errors
///
/// Returns an error if the http backend has no gateway URL or its client
/// cannot be built.
pub fn build_blob_store(config: &ServiceConfig) -> Result<Arc<dyn BlobStore>, BlobError> {
    let bucket = config.cascade.bucket.clone();
    let store: Arc<dyn BlobStore> = match config.blob_backend {
        BlobBackend::Http => {
            let url = config.blob_gateway_url.as_deref().ok_or_else(|| {
                BlobError::Configuration("BLOB_GATEWAY_URL is required for the http backend".into())
            })?;
            tracing::info!(gateway = %url, bucket = %bucket, "Using HTTP blob gateway");
            Arc::new(HttpBlobStore::new(
                url,
                bucket,
                config.blob_gateway_token.clone(),
            )?)
        }
        BlobBackend::Fs => {
            tracing::info!(root = %config.blob_root, bucket = %bucket, "Using filesystem blob store");
            Arc::new(FsBlobStore::new(Path::new(&config.blob_root), bucket))
        }
        BlobBackend::Memory => {
            tracing::warn!(bucket = %bucket, "Using in-memory blob store");
            Arc::new(MemoryBlobStore::new(bucket))
        }
    };
    Ok(store)
}
