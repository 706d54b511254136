//! Filesystem blob store.
//!
//! Objects are files under `root/bucket/`, with `/` in a key mapping to
//! subdirectories.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::{check_batch, BlobStore, BulkDeleteOutcome, KeyFailure, DEFAULT_MAX_BATCH_SIZE};

/// Blob store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    bucket: String,
}

impl FsBlobStore {
    /// Create a store rooted at `root` for `bucket`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    /// Filesystem path of an object, or `None` if the key would escape the
    /// bucket directory.
    #[must_use]
    pub fn object_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(&self.bucket).join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<BulkDeleteOutcome> {
        check_batch(keys, DEFAULT_MAX_BATCH_SIZE)?;

        let mut outcome = BulkDeleteOutcome::default();
        for key in keys {
            let Some(path) = self.object_path(key) else {
                outcome
                    .failed
                    .push(KeyFailure::new(key.clone(), "InvalidKey", "key escapes bucket"));
                continue;
            };

            match tokio::fs::remove_file(&path).await {
                Ok(()) => outcome.deleted.push(key.clone()),
                Err(e) if e.kind() == ErrorKind::NotFound => outcome.deleted.push(key.clone()),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to remove blob file");
                    outcome
                        .failed
                        .push(KeyFailure::new(key.clone(), "IoError", e.to_string()));
                }
            }
        }

        Ok(outcome)
    }
}
