//! Common test utilities for cascade integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use classroom_blob::{BlobError, BlobStore, BulkDeleteOutcome, KeyFailure};
use classroom_cascade::{CascadeConfig, CascadeEngine};
use classroom_core::{
    Assignment, AssignmentId, Collection, CommunityComment, CommunityPost, Course, CourseId,
    Interaction, PeerResponse, PostId, RosterEntry, Submission, UserId,
};
use classroom_store::{MemoryRecordStore, RecordStore, RosterWrite, StoreError};

pub const BUCKET: &str = "classroom-media";

// =============================================================================
// Record store wrapper
// =============================================================================

/// Memory record store that can fail chosen deletes, fake roster races and
/// remembers the order of deletes.
#[derive(Default)]
pub struct FlakyRecordStore {
    pub inner: MemoryRecordStore,
    failing_deletes: Mutex<HashSet<String>>,
    roster_conflicts: AtomicU32,
    late_enrollments: Mutex<Vec<UserId>>,
    deletes: Mutex<Vec<(Collection, String)>>,
}

impl FlakyRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delete of `id` fail.
    pub fn fail_delete(&self, id: impl Into<String>) {
        self.failing_deletes.lock().unwrap().insert(id.into());
    }

    /// Let every delete succeed again.
    pub fn clear_failing_deletes(&self) {
        self.failing_deletes.lock().unwrap().clear();
    }

    /// Report a version conflict on the next `n` roster writes.
    pub fn conflict_roster_writes(&self, n: u32) {
        self.roster_conflicts.store(n, Ordering::SeqCst);
    }

    /// Enroll `student` through a plain course write just before the next
    /// roster write, as another request would.
    pub fn enroll_before_next_roster_write(&self, student: UserId) {
        self.late_enrollments.lock().unwrap().push(student);
    }

    /// Deletes issued so far, in order.
    pub fn deletes(&self) -> Vec<(Collection, String)> {
        self.deletes.lock().unwrap().clone()
    }

    /// Position of the first delete in `collection`.
    pub fn first_delete_of(&self, collection: Collection) -> Option<usize> {
        self.deletes().iter().position(|(c, _)| *c == collection)
    }

    /// Position of the last delete in `collection`.
    pub fn last_delete_of(&self, collection: Collection) -> Option<usize> {
        self.deletes().iter().rposition(|(c, _)| *c == collection)
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn put_course(&self, course: &Course) -> classroom_store::Result<()> {
        self.inner.put_course(course).await
    }

    async fn get_course(&self, course_id: &CourseId) -> classroom_store::Result<Option<Course>> {
        self.inner.get_course(course_id).await
    }

    async fn update_roster(
        &self,
        course_id: &CourseId,
        expected_version: u64,
        roster: Vec<RosterEntry>,
    ) -> classroom_store::Result<RosterWrite> {
        let late: Vec<UserId> = self.late_enrollments.lock().unwrap().drain(..).collect();
        if !late.is_empty() {
            if let Some(mut course) = self.inner.get_course(course_id).await? {
                for student in late {
                    course.enroll(student);
                }
                self.inner.put_course(&course).await?;
            }
        }

        let pending = self.roster_conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.roster_conflicts.store(pending - 1, Ordering::SeqCst);
            return Ok(RosterWrite::Conflict {
                current_version: expected_version + 1,
            });
        }
        self.inner.update_roster(course_id, expected_version, roster).await
    }

    async fn put_assignment(&self, assignment: &Assignment) -> classroom_store::Result<()> {
        self.inner.put_assignment(assignment).await
    }

    async fn list_assignments_by_course(
        &self,
        course_id: &CourseId,
    ) -> classroom_store::Result<Vec<Assignment>> {
        self.inner.list_assignments_by_course(course_id).await
    }

    async fn put_submission(&self, submission: &Submission) -> classroom_store::Result<()> {
        self.inner.put_submission(submission).await
    }

    async fn list_submissions_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> classroom_store::Result<Vec<Submission>> {
        self.inner.list_submissions_by_assignment(assignment_id).await
    }

    async fn list_submissions_by_course(
        &self,
        course_id: &CourseId,
    ) -> classroom_store::Result<Vec<Submission>> {
        self.inner.list_submissions_by_course(course_id).await
    }

    async fn list_submissions_by_student(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> classroom_store::Result<Vec<Submission>> {
        self.inner.list_submissions_by_student(student_id, course_id).await
    }

    async fn put_peer_response(&self, response: &PeerResponse) -> classroom_store::Result<()> {
        self.inner.put_peer_response(response).await
    }

    async fn list_peer_responses_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> classroom_store::Result<Vec<PeerResponse>> {
        self.inner.list_peer_responses_by_assignment(assignment_id).await
    }

    async fn list_peer_responses_by_reviewer(
        &self,
        reviewer_id: &UserId,
    ) -> classroom_store::Result<Vec<PeerResponse>> {
        self.inner.list_peer_responses_by_reviewer(reviewer_id).await
    }

    async fn put_post(&self, post: &CommunityPost) -> classroom_store::Result<()> {
        self.inner.put_post(post).await
    }

    async fn list_posts_by_course(
        &self,
        course_id: &CourseId,
    ) -> classroom_store::Result<Vec<CommunityPost>> {
        self.inner.list_posts_by_course(course_id).await
    }

    async fn put_comment(&self, comment: &CommunityComment) -> classroom_store::Result<()> {
        self.inner.put_comment(comment).await
    }

    async fn list_comments_by_post(
        &self,
        post_id: &PostId,
    ) -> classroom_store::Result<Vec<CommunityComment>> {
        self.inner.list_comments_by_post(post_id).await
    }

    async fn list_comments_by_author(
        &self,
        author_id: &UserId,
    ) -> classroom_store::Result<Vec<CommunityComment>> {
        self.inner.list_comments_by_author(author_id).await
    }

    async fn put_interaction(&self, interaction: &Interaction) -> classroom_store::Result<()> {
        self.inner.put_interaction(interaction).await
    }

    async fn list_interactions_by_user(
        &self,
        user_id: &UserId,
    ) -> classroom_store::Result<Vec<Interaction>> {
        self.inner.list_interactions_by_user(user_id).await
    }

    async fn list_interactions_by_target(
        &self,
        target_id: &str,
    ) -> classroom_store::Result<Vec<Interaction>> {
        self.inner.list_interactions_by_target(target_id).await
    }

    async fn exists(&self, collection: Collection, id: &str) -> classroom_store::Result<bool> {
        self.inner.exists(collection, id).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> classroom_store::Result<bool> {
        self.deletes
            .lock()
            .unwrap()
            .push((collection, id.to_string()));
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(StoreError::Database("simulated write failure".into()));
        }
        self.inner.delete(collection, id).await
    }
}

// =============================================================================
// Blob store fake
// =============================================================================

/// Blob store that records batches and can reject keys or whole requests.
pub struct RecordingBlobStore {
    max_batch_size: usize,
    rejected: Mutex<HashSet<String>>,
    failing_batches: AtomicU32,
    batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingBlobStore {
    pub fn new() -> Self {
        Self::with_max_batch_size(classroom_blob::DEFAULT_MAX_BATCH_SIZE)
    }

    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size,
            rejected: Mutex::new(HashSet::new()),
            failing_batches: AtomicU32::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Refuse to delete `key`.
    pub fn reject(&self, key: impl Into<String>) {
        self.rejected.lock().unwrap().insert(key.into());
    }

    /// Fail the next `n` requests outright.
    pub fn fail_next_batches(&self, n: u32) {
        self.failing_batches.store(n, Ordering::SeqCst);
    }

    /// Every batch received, in arrival order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    /// Every key received across all batches.
    pub fn all_keys(&self) -> Vec<String> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    fn bucket(&self) -> &str {
        BUCKET
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn delete_objects(&self, keys: &[String]) -> classroom_blob::Result<BulkDeleteOutcome> {
        assert!(
            keys.len() <= self.max_batch_size,
            "batch of {} exceeds ceiling {}",
            keys.len(),
            self.max_batch_size
        );
        self.batches.lock().unwrap().push(keys.to_vec());

        let pending = self.failing_batches.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_batches.store(pending - 1, Ordering::SeqCst);
            return Err(BlobError::Api {
                status: 503,
                message: "gateway unavailable".into(),
            });
        }

        let rejected = self.rejected.lock().unwrap();
        let (failed, deleted): (Vec<_>, Vec<_>) =
            keys.iter().cloned().partition(|k| rejected.contains(k));
        Ok(BulkDeleteOutcome {
            deleted,
            failed: failed
                .into_iter()
                .map(|k| KeyFailure::new(k, "AccessDenied", "Access Denied"))
                .collect(),
        })
    }
}

// =============================================================================
// Harness
// =============================================================================

/// An engine wired to inspectable fakes.
pub struct TestHarness {
    pub records: Arc<FlakyRecordStore>,
    pub blobs: Arc<RecordingBlobStore>,
    pub engine: CascadeEngine,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_blobs(RecordingBlobStore::new())
    }

    pub fn with_blobs(blobs: RecordingBlobStore) -> Self {
        let records = Arc::new(FlakyRecordStore::new());
        let blobs = Arc::new(blobs);
        let engine = CascadeEngine::new(
            records.clone(),
            blobs.clone(),
            CascadeConfig::for_bucket(BUCKET),
        )
        .expect("valid config");
        Self {
            records,
            blobs,
            engine,
        }
    }

    pub fn store(&self) -> &MemoryRecordStore {
        &self.records.inner
    }

    /// Create a course with the given students on its roster.
    pub async fn course(&self, id: &str, students: &[&str]) -> Course {
        let mut course = Course::new(id.parse().unwrap(), "Course", "C-1", uid("user_teacher"));
        for s in students {
            course.enroll(uid(s));
        }
        self.records.put_course(&course).await.unwrap();
        course
    }

    pub async fn assignment(&self, course: &CourseId) -> Assignment {
        let assignment = Assignment::new(course.clone(), "Assignment");
        self.records.put_assignment(&assignment).await.unwrap();
        assignment
    }

    /// Create a submission with an optional stored video key.
    pub async fn submission(
        &self,
        assignment: &Assignment,
        student: &str,
        video_key: Option<&str>,
    ) -> Submission {
        let mut submission =
            Submission::new(assignment.id.clone(), assignment.course_id.clone(), uid(student));
        submission.video_key = video_key.map(str::to_string);
        self.records.put_submission(&submission).await.unwrap();
        submission
    }

    /// Create a submission whose video lives on an external host.
    pub async fn external_submission(&self, assignment: &Assignment, student: &str) -> Submission {
        let mut submission =
            Submission::new(assignment.id.clone(), assignment.course_id.clone(), uid(student));
        submission.video_url = Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".into());
        submission.externally_hosted = true;
        self.records.put_submission(&submission).await.unwrap();
        submission
    }

    pub async fn peer_response(&self, reviewer: &str, submission: &Submission) -> PeerResponse {
        let response = PeerResponse::new(
            uid(reviewer),
            submission.assignment_id.clone(),
            submission.id.clone(),
            "Nice work",
        );
        self.records.put_peer_response(&response).await.unwrap();
        response
    }

    pub async fn post(&self, course: &CourseId, author: &str) -> CommunityPost {
        let post = CommunityPost::new(course.clone(), uid(author), "Hello");
        self.records.put_post(&post).await.unwrap();
        post
    }

    pub async fn comment(&self, post: &CommunityPost, author: &str) -> CommunityComment {
        let comment = CommunityComment::new(post.id.clone(), uid(author), "Reply");
        self.records.put_comment(&comment).await.unwrap();
        comment
    }

    pub async fn interaction(&self, user: &str, target: &str) -> Interaction {
        let interaction =
            Interaction::new(uid(user), target, classroom_core::InteractionKind::Like);
        self.records.put_interaction(&interaction).await.unwrap();
        interaction
    }

    pub async fn exists(&self, collection: Collection, id: impl AsRef<str>) -> bool {
        self.records.exists(collection, id.as_ref()).await.unwrap()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn uid(s: &str) -> UserId {
    s.parse().unwrap()
}
