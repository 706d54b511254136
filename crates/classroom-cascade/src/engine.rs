//! The cascade orchestrator.

use std::sync::Arc;

use classroom_blob::BlobStore;
use classroom_core::{
    CascadePlan, CascadeRoot, Collection, CourseDeletionReport, CourseId, StudentRemovalReport,
    UserId,
};
use classroom_store::RecordStore;
use tracing::{info, warn};

use crate::blobs::BatchBlobDeleter;
use crate::config::CascadeConfig;
use crate::enrollment::EnrollmentMutator;
use crate::error::{CascadeError, Result};
use crate::ledger::Ledger;
use crate::records::RecordDeleter;
use crate::resolver::{Dependents, Resolver};

/// Deletes courses and removes students, along with everything that
/// depends on them.
///
/// Phases run in a fixed order: resolve dependents, delete blobs, delete
/// dependent records, then delete the course or update its roster. Every
/// phase runs even if an earlier one had failures.
#[derive(Clone)]
pub struct CascadeEngine {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    config: CascadeConfig,
}

impl std::fmt::Debug for CascadeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeEngine")
            .field("bucket", &self.blobs.bucket())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CascadeEngine {
    /// Create an engine over the given stores.
    ///
    /// The batch size is clamped to what the blob store accepts.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Configuration`] if the configuration is invalid.
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        mut config: CascadeConfig,
    ) -> Result<Self> {
        config.validate()?;
        config.max_batch_size = config.max_batch_size.min(blobs.max_batch_size().max(1));
        if config.bucket != blobs.bucket() {
            warn!(
                configured = %config.bucket,
                store = %blobs.bucket(),
                "Configured bucket differs from blob store bucket"
            );
        }
        Ok(Self {
            records,
            blobs,
            config,
        })
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.records.as_ref(), self.config.record_concurrency)
    }

    fn record_deleter(&self) -> RecordDeleter<'_> {
        RecordDeleter::new(self.records.as_ref(), self.config.record_concurrency)
    }

    fn blob_deleter(&self) -> BatchBlobDeleter<'_> {
        BatchBlobDeleter::new(
            self.blobs.as_ref(),
            self.config.max_batch_size,
            self.config.blob_concurrency,
        )
    }

    /// Delete a course and everything owned by it.
    ///
    /// A missing course is noted in the report and the cascade still runs,
    /// so stragglers left by an earlier partial run get cleaned up.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::InvalidIdentifier`] if `course_id` is blank or
    /// malformed. Nothing is touched in that case.
    pub async fn delete_course(&self, course_id: &str) -> Result<CourseDeletionReport> {
        let course_id = parse_course_id(course_id)?;
        info!(course_id = %course_id, "Starting course deletion");

        let mut ledger = Ledger::new();
        self.note_missing_course(&course_id, &mut ledger).await;

        let deps = self.resolver().resolve_course(&course_id).await;
        self.delete_dependents(deps, &mut ledger).await;

        let course_deleted = match self
            .record_deleter()
            .delete_root(Collection::Courses, course_id.as_str())
            .await
        {
            Ok(existed) => existed,
            Err(message) => {
                ledger.error(message);
                false
            }
        };

        let report = ledger.into_course_report(course_id, course_deleted);
        info!(
            course_id = %report.course_id,
            status = ?report.status,
            assignments = report.assignments,
            submissions = report.submissions,
            peer_responses = report.peer_responses,
            videos_deleted = report.videos_deleted,
            videos_failed = report.videos_failed,
            errors = report.errors.len(),
            "Course deletion finished"
        );
        Ok(report)
    }

    /// Remove a student from a course along with their work in it.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::InvalidIdentifier`] if either identifier is
    /// blank or malformed.
    pub async fn remove_student(
        &self,
        course_id: &str,
        student_id: &str,
    ) -> Result<StudentRemovalReport> {
        let course_id = parse_course_id(course_id)?;
        let student_id = parse_student_id(student_id)?;
        info!(course_id = %course_id, student_id = %student_id, "Starting student removal");

        let mut ledger = Ledger::new();
        let deps = self.resolver().resolve_student(&course_id, &student_id).await;
        self.delete_dependents(deps, &mut ledger).await;

        let mutator =
            EnrollmentMutator::new(self.records.as_ref(), self.config.roster_update_attempts);
        let roster = mutator.remove_student(&course_id, &student_id).await;
        ledger.errors(roster.errors);

        let report = ledger.into_student_report(course_id, student_id, roster.roster_size);
        info!(
            course_id = %report.course_id,
            student_id = %report.student_id,
            status = ?report.status,
            submissions = report.submissions_deleted,
            objects_deleted = report.s3_objects_deleted,
            objects_failed = report.s3_objects_failed,
            errors = report.errors.len(),
            "Student removal finished"
        );
        Ok(report)
    }

    /// What [`CascadeEngine::delete_course`] would delete.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::InvalidIdentifier`] if `course_id` is blank or
    /// malformed.
    pub async fn preview_course(&self, course_id: &str) -> Result<CascadePlan> {
        let course_id = parse_course_id(course_id)?;

        let mut ledger = Ledger::new();
        self.note_missing_course(&course_id, &mut ledger).await;
        let deps = self.resolver().resolve_course(&course_id).await;

        Ok(self.plan(CascadeRoot::Course { course_id }, deps, ledger))
    }

    /// What [`CascadeEngine::remove_student`] would delete.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::InvalidIdentifier`] if either identifier is
    /// blank or malformed.
    pub async fn preview_student(&self, course_id: &str, student_id: &str) -> Result<CascadePlan> {
        let course_id = parse_course_id(course_id)?;
        let student_id = parse_student_id(student_id)?;

        let deps = self.resolver().resolve_student(&course_id, &student_id).await;
        let root = CascadeRoot::StudentInCourse {
            course_id,
            student_id,
        };

        Ok(self.plan(root, deps, Ledger::new()))
    }

    async fn note_missing_course(&self, course_id: &CourseId, ledger: &mut Ledger) {
        match self.records.exists(Collection::Courses, course_id.as_str()).await {
            Ok(true) => {}
            Ok(false) => ledger.error(format!("course {course_id} not found")),
            Err(e) => ledger.error(format!("course {course_id}: failed to read course: {e}")),
        }
    }

    /// Blob and record phases shared by both cascades.
    async fn delete_dependents(&self, mut deps: Dependents, ledger: &mut Ledger) {
        ledger.errors(std::mem::take(&mut deps.errors));

        let keys = deps.blob_keys(&self.config.bucket);
        ledger.blobs(self.blob_deleter().delete(keys).await);
        ledger.records(self.record_deleter().delete_dependents(&deps).await);
    }

    fn plan(&self, root: CascadeRoot, mut deps: Dependents, mut ledger: Ledger) -> CascadePlan {
        ledger.errors(std::mem::take(&mut deps.errors));
        let counts = deps.counts();
        let blob_keys = deps.blob_keys(&self.config.bucket);
        ledger.into_plan(root, counts, blob_keys)
    }
}

fn parse_course_id(raw: &str) -> Result<CourseId> {
    CourseId::new(raw).map_err(|source| CascadeError::InvalidIdentifier {
        field: "course_id",
        source,
    })
}

fn parse_student_id(raw: &str) -> Result<UserId> {
    UserId::new(raw).map_err(|source| CascadeError::InvalidIdentifier {
        field: "student_id",
        source,
    })
}
