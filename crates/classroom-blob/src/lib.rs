//! Blob object store clients.
//!
//! Media files (submission videos and thumbnails) live in an object store
//! outside the record store. The only operation the platform needs from it
//! here is bulk deletion by key, so that is all [`BlobStore`] exposes.
//!
//! # Backends
//!
//! - [`HttpBlobStore`]: an object gateway reached over HTTP
//! - [`FsBlobStore`]: a local directory, one file per key
//! - [`MemoryBlobStore`]: process-local, for tests and development
//!
//! # Example
//!
//! ```no_run
//! use classroom_blob::{BlobStore, HttpBlobStore};
//!
//! # async fn example() -> Result<(), classroom_blob::BlobError> {
//! let store = HttpBlobStore::new("http://blob-gateway:9000", "classroom-media", None)?;
//!
//! let outcome = store
//!     .delete_objects(&["videos/course_1/stu_1/clip.mp4".to_string()])
//!     .await?;
//! println!("deleted {} objects", outcome.deleted.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod fs;
mod http;
mod memory;

pub use error::{BlobError, Result};
pub use fs::FsBlobStore;
pub use http::{HttpBlobStore, HttpBlobStoreOptions};
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Maximum number of keys per bulk-delete request, matching the S3
/// `DeleteObjects` ceiling.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Per-key result of one bulk-delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteOutcome {
    /// Keys that are gone, including keys that were already absent.
    #[serde(default)]
    pub deleted: Vec<String>,

    /// Keys the store refused or failed to delete.
    #[serde(default, rename = "errors")]
    pub failed: Vec<KeyFailure>,
}

/// A key that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFailure {
    /// The key.
    pub key: String,

    /// Store-specific error code (e.g. `AccessDenied`).
    pub code: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl KeyFailure {
    /// Create a key failure.
    #[must_use]
    pub fn new(key: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A blob object store that supports bulk deletion.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// The bucket (container) this handle targets.
    fn bucket(&self) -> &str;

    /// Maximum number of keys accepted by one [`BlobStore::delete_objects`] call.
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Delete a batch of objects.
    ///
    /// Deleting an absent key succeeds. Per-key failures are reported in the
    /// outcome; an `Err` means the request as a whole failed and nothing is
    /// known about individual keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch exceeds [`BlobStore::max_batch_size`] or
    /// the request fails.
    async fn delete_objects(&self, keys: &[String]) -> Result<BulkDeleteOutcome>;
}

/// Reject batches over the store's ceiling.
fn check_batch(keys: &[String], max: usize) -> Result<()> {
    if keys.len() > max {
        return Err(BlobError::BatchTooLarge {
            size: keys.len(),
            max,
        });
    }
    Ok(())
}
