//! Record deletion.

use std::collections::{BTreeMap, BTreeSet};

use classroom_core::Collection;
use classroom_store::RecordStore;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::resolver::Dependents;

/// Collections removed before their parents.
pub const LEAF_COLLECTIONS: [Collection; 4] = [
    Collection::Submissions,
    Collection::PeerResponses,
    Collection::CommunityComments,
    Collection::Interactions,
];

/// Collections removed once their leaves are gone.
pub const PARENT_COLLECTIONS: [Collection; 2] =
    [Collection::Assignments, Collection::CommunityPosts];

/// Outcome of deleting one collection's records.
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    /// Records deleted, absent ones included.
    pub deleted: usize,
    /// IDs whose delete failed.
    pub failed: BTreeSet<String>,
    /// One entry per failed delete.
    pub errors: Vec<String>,
}

/// Counts and failures from deleting records.
#[derive(Debug, Default)]
pub struct RecordPhase {
    /// Records deleted per collection.
    pub deleted: BTreeMap<Collection, usize>,
    /// One entry per failed delete.
    pub errors: Vec<String>,
}

impl RecordPhase {
    fn absorb(&mut self, collection: Collection, deleted: usize, errors: Vec<String>) {
        *self.deleted.entry(collection).or_default() += deleted;
        self.errors.extend(errors);
    }

    /// Records deleted in one collection.
    #[must_use]
    pub fn count(&self, collection: Collection) -> usize {
        self.deleted.get(&collection).copied().unwrap_or(0)
    }
}

/// Issues concurrent point deletes against the record store.
pub struct RecordDeleter<'a> {
    records: &'a dyn RecordStore,
    concurrency: usize,
}

impl<'a> RecordDeleter<'a> {
    /// Create a deleter.
    #[must_use]
    pub fn new(records: &'a dyn RecordStore, concurrency: usize) -> Self {
        Self {
            records,
            concurrency: concurrency.max(1),
        }
    }

    /// Delete every dependent record, leaves first.
    ///
    /// All leaf collections are attempted before any parent collection, and
    /// a failure in one collection never stops the others. A parent whose
    /// leaves failed to delete is kept so a later run can still find them.
    pub async fn delete_dependents(&self, deps: &Dependents) -> RecordPhase {
        let mut phase = RecordPhase::default();

        let leaves = futures::future::join_all(
            LEAF_COLLECTIONS
                .iter()
                .map(|&collection| self.delete_collection(collection, deps.ids(collection))),
        )
        .await;
        let mut failed = BTreeMap::new();
        for (collection, outcome) in LEAF_COLLECTIONS.iter().zip(leaves) {
            phase.absorb(*collection, outcome.deleted, outcome.errors);
            failed.insert(*collection, outcome.failed);
        }

        let held = held_parents(deps, &failed);
        let parents = futures::future::join_all(PARENT_COLLECTIONS.iter().map(|&collection| {
            let ids = deps
                .ids(collection)
                .into_iter()
                .filter(|id| !held.contains_key(&(collection, id.clone())))
                .collect();
            self.delete_collection(collection, ids)
        }))
        .await;
        for (collection, outcome) in PARENT_COLLECTIONS.iter().zip(parents) {
            phase.absorb(*collection, outcome.deleted, outcome.errors);
        }

        for ((collection, id), blocked) in held {
            warn!(
                collection = %collection,
                id = %id,
                blocked,
                "Keeping record with undeleted dependents"
            );
            phase.errors.push(format!(
                "{} {id} kept: {blocked} dependent records failed to delete",
                collection.record_label()
            ));
        }

        phase
    }

    /// Delete a set of records from one collection.
    ///
    /// A record that is already gone counts as deleted.
    pub async fn delete_collection(
        &self,
        collection: Collection,
        ids: Vec<String>,
    ) -> CollectionOutcome {
        let mut outcome = CollectionOutcome::default();
        if ids.is_empty() {
            return outcome;
        }
        debug!(collection = %collection, records = ids.len(), "Deleting records");

        let results: Vec<_> = stream::iter(ids)
            .map(|id| async move {
                let result = self.records.delete(collection, &id).await;
                (id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (id, result) in results {
            match result {
                Ok(existed) => {
                    if !existed {
                        debug!(collection = %collection, id = %id, "Record already absent");
                    }
                    outcome.deleted += 1;
                }
                Err(e) => {
                    warn!(collection = %collection, id = %id, error = %e, "Record delete failed");
                    outcome
                        .errors
                        .push(format!("{} {id}: {e}", collection.record_label()));
                    outcome.failed.insert(id);
                }
            }
        }
        outcome
    }

    /// Delete a single root record.
    ///
    /// Returns whether the record existed, or the error line on failure.
    pub async fn delete_root(&self, collection: Collection, id: &str) -> Result<bool, String> {
        self.records.delete(collection, id).await.map_err(|e| {
            warn!(collection = %collection, id = %id, error = %e, "Root delete failed");
            format!("{} {id}: {e}", collection.record_label())
        })
    }
}

/// Parents that still have a leaf which failed to delete, with the number
/// of such leaves.
fn held_parents(
    deps: &Dependents,
    failed: &BTreeMap<Collection, BTreeSet<String>>,
) -> BTreeMap<(Collection, String), usize> {
    let failed_in = |collection: Collection, id: String| {
        failed
            .get(&collection)
            .is_some_and(|ids| ids.contains(&id))
    };
    let post_ids: BTreeSet<String> = deps.posts.iter().map(|p| p.id.to_string()).collect();

    let mut held = BTreeMap::new();
    let mut hold = |collection: Collection, id: String| {
        *held.entry((collection, id)).or_insert(0) += 1;
    };
    for s in &deps.submissions {
        if failed_in(Collection::Submissions, s.id.to_string()) {
            hold(Collection::Assignments, s.assignment_id.to_string());
        }
    }
    for r in &deps.peer_responses {
        if failed_in(Collection::PeerResponses, r.id.to_string()) {
            hold(Collection::Assignments, r.assignment_id.to_string());
        }
    }
    for c in &deps.comments {
        if failed_in(Collection::CommunityComments, c.id.to_string()) {
            hold(Collection::CommunityPosts, c.post_id.to_string());
        }
    }
    for i in &deps.interactions {
        if failed_in(Collection::Interactions, i.id.to_string()) && post_ids.contains(&i.target_id)
        {
            hold(Collection::CommunityPosts, i.target_id.clone());
        }
    }

    let assignment_ids: BTreeSet<String> =
        deps.assignments.iter().map(|a| a.id.to_string()).collect();
    held.retain(|(collection, id), _| match collection {
        Collection::Assignments => assignment_ids.contains(id),
        _ => post_ids.contains(id),
    });
    held
}
