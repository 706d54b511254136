//! In-memory blob store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::{check_batch, BlobStore, BulkDeleteOutcome, DEFAULT_MAX_BATCH_SIZE};

/// Process-local blob store holding a set of keys.
#[derive(Debug)]
pub struct MemoryBlobStore {
    bucket: String,
    max_batch_size: usize,
    objects: RwLock<BTreeSet<String>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_max_batch_size(bucket, DEFAULT_MAX_BATCH_SIZE)
    }

    /// Create an empty store with a custom per-request ceiling.
    #[must_use]
    pub fn with_max_batch_size(bucket: impl Into<String>, max_batch_size: usize) -> Self {
        Self {
            bucket: bucket.into(),
            max_batch_size: max_batch_size.max(1),
            objects: RwLock::new(BTreeSet::new()),
        }
    }

    /// Store an object.
    pub async fn put(&self, key: impl Into<String>) {
        self.objects.write().await.insert(key.into());
    }

    /// Whether an object exists.
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains(key)
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<BulkDeleteOutcome> {
        check_batch(keys, self.max_batch_size)?;

        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }

        Ok(BulkDeleteOutcome {
            deleted: keys.to_vec(),
            failed: Vec::new(),
        })
    }
}
