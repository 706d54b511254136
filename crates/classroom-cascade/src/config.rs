//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CascadeError, Result};

/// Default bucket holding submission media.
pub const DEFAULT_BUCKET: &str = "classroom-media";

/// Tuning for a [`CascadeEngine`](crate::CascadeEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Bucket name stripped from URL-style media locators.
    pub bucket: String,

    /// Keys per bulk-delete request. Clamped to the blob store's own ceiling.
    pub max_batch_size: usize,

    /// Bulk-delete requests in flight at once.
    pub blob_concurrency: usize,

    /// Record store calls in flight at once, per collection.
    pub record_concurrency: usize,

    /// Attempts at the conditional roster write before giving up.
    pub roster_update_attempts: u32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            max_batch_size: classroom_blob::DEFAULT_MAX_BATCH_SIZE,
            blob_concurrency: 4,
            record_concurrency: 16,
            roster_update_attempts: 5,
        }
    }
}

impl CascadeConfig {
    /// Default tuning for the given bucket.
    #[must_use]
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Check that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Configuration`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(CascadeError::Configuration("bucket must not be empty".into()));
        }
        let limits = [
            ("max_batch_size", self.max_batch_size),
            ("blob_concurrency", self.blob_concurrency),
            ("record_concurrency", self.record_concurrency),
        ];
        if let Some((field, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(CascadeError::Configuration(format!(
                "{field} must be at least 1"
            )));
        }
        if self.roster_update_attempts == 0 {
            return Err(CascadeError::Configuration(
                "roster_update_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
