//! Report aggregation.
//!
//! Each phase hands its counts and error lines to a [`Ledger`], which turns
//! them into the final report once every phase has run.

use std::collections::BTreeMap;

use classroom_core::{
    CascadePlan, CascadeRoot, CascadeStatus, Collection, CourseDeletionReport, CourseId,
    StudentRemovalReport, UserId,
};

use crate::blobs::{BlobPhase, BlobTally};
use crate::records::RecordPhase;

/// Running totals for one cascade.
#[derive(Debug, Default)]
pub struct Ledger {
    deleted: BTreeMap<Collection, usize>,
    blobs: BlobTally,
    errors: Vec<String>,
}

impl Ledger {
    /// Start an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single error line.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Record several error lines.
    pub fn errors(&mut self, messages: impl IntoIterator<Item = String>) {
        self.errors.extend(messages);
    }

    /// Fold in the blob phase.
    pub fn blobs(&mut self, phase: BlobPhase) {
        self.blobs.deleted += phase.tally.deleted;
        self.blobs.failed += phase.tally.failed;
        self.errors.extend(phase.errors);
    }

    /// Fold in the record phase.
    pub fn records(&mut self, phase: RecordPhase) {
        for (collection, count) in phase.deleted {
            *self.deleted.entry(collection).or_default() += count;
        }
        self.errors.extend(phase.errors);
    }

    /// Number of error lines so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn count(&self, collection: Collection) -> usize {
        self.deleted.get(&collection).copied().unwrap_or(0)
    }

    /// Build the course deletion report.
    #[must_use]
    pub fn into_course_report(
        self,
        course_id: CourseId,
        course_deleted: bool,
    ) -> CourseDeletionReport {
        CourseDeletionReport {
            success: true,
            status: CascadeStatus::from_errors(&self.errors),
            course_id,
            course_deleted,
            assignments: self.count(Collection::Assignments),
            submissions: self.count(Collection::Submissions),
            peer_responses: self.count(Collection::PeerResponses),
            community_posts: self.count(Collection::CommunityPosts),
            community_comments: self.count(Collection::CommunityComments),
            interactions: self.count(Collection::Interactions),
            videos_deleted: self.blobs.deleted,
            videos_failed: self.blobs.failed,
            errors: self.errors,
        }
    }

    /// Build the student removal report.
    #[must_use]
    pub fn into_student_report(
        self,
        course_id: CourseId,
        student_id: UserId,
        roster_size: Option<usize>,
    ) -> StudentRemovalReport {
        StudentRemovalReport {
            success: true,
            status: CascadeStatus::from_errors(&self.errors),
            course_id,
            student_id,
            submissions_deleted: self.count(Collection::Submissions),
            peer_responses_deleted: self.count(Collection::PeerResponses),
            community_posts_deleted: self.count(Collection::CommunityPosts),
            community_comments_deleted: self.count(Collection::CommunityComments),
            interactions_deleted: self.count(Collection::Interactions),
            s3_objects_deleted: self.blobs.deleted,
            s3_objects_failed: self.blobs.failed,
            roster_size,
            errors: self.errors,
        }
    }

    /// Build a dry-run plan.
    #[must_use]
    pub fn into_plan(
        self,
        root: CascadeRoot,
        counts: BTreeMap<Collection, usize>,
        blob_keys: Vec<String>,
    ) -> CascadePlan {
        CascadePlan {
            root,
            counts,
            blob_keys,
            errors: self.errors,
        }
    }
}
