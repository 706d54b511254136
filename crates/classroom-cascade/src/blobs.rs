//! Batched blob deletion.

use std::collections::BTreeSet;

use classroom_blob::BlobStore;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Blob deletion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobTally {
    /// Objects confirmed gone.
    pub deleted: usize,
    /// Objects that may still exist.
    pub failed: usize,
}

/// Result of a blob phase.
#[derive(Debug, Default)]
pub struct BlobPhase {
    /// Totals across all batches.
    pub tally: BlobTally,
    /// One entry per rejected key or failed batch.
    pub errors: Vec<String>,
    /// Number of bulk-delete requests issued.
    pub batches: usize,
}

/// Deletes blob objects in batches no larger than the store accepts.
pub struct BatchBlobDeleter<'a> {
    store: &'a dyn BlobStore,
    batch_size: usize,
    concurrency: usize,
}

impl<'a> BatchBlobDeleter<'a> {
    /// Create a deleter.
    ///
    /// `batch_size` is clamped to `store.max_batch_size()`.
    #[must_use]
    pub fn new(store: &'a dyn BlobStore, batch_size: usize, concurrency: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.clamp(1, store.max_batch_size().max(1)),
            concurrency: concurrency.max(1),
        }
    }

    /// Delete every key once.
    ///
    /// Duplicate keys are collapsed before batching. A batch whose request
    /// fails counts all of its keys as failed; the other batches still run.
    pub async fn delete(&self, keys: impl IntoIterator<Item = String>) -> BlobPhase {
        let unique: Vec<String> = keys
            .into_iter()
            .filter(|k| !k.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut phase = BlobPhase::default();
        if unique.is_empty() {
            return phase;
        }

        let batches: Vec<&[String]> = unique.chunks(self.batch_size).collect();
        phase.batches = batches.len();
        debug!(
            bucket = %self.store.bucket(),
            keys = unique.len(),
            batches = batches.len(),
            "Deleting blob objects"
        );

        let results: Vec<_> = stream::iter(0..batches.len())
            .map(|index| {
                let batch = batches[index];
                async move { (index, batch, self.store.delete_objects(batch).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (index, batch, result) in results {
            match result {
                Ok(outcome) => {
                    phase.tally.deleted += outcome.deleted.len();
                    phase.tally.failed += outcome.failed.len();
                    for failure in outcome.failed {
                        warn!(key = %failure.key, code = %failure.code, "Blob object not deleted");
                        let detail = if failure.message.is_empty() {
                            failure.code
                        } else {
                            format!("{} ({})", failure.code, failure.message)
                        };
                        phase.errors.push(format!("blob {}: {detail}", failure.key));
                    }
                }
                Err(e) => {
                    warn!(batch = index, keys = batch.len(), error = %e, "Blob batch failed");
                    phase.tally.failed += batch.len();
                    phase.errors.push(format!(
                        "blob batch {} ({} keys) failed: {e}",
                        index + 1,
                        batch.len()
                    ));
                }
            }
        }

        phase
    }
}
