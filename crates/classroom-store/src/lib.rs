//! Record store for the classroom platform.
//!
//! This crate provides persistent storage for courses and everything that
//! hangs off them: assignments, submissions, peer responses, community posts
//! and comments, and interactions.
//!
//! # Backends
//!
//! - [`MemoryRecordStore`]: process-local maps, for tests and development
//! - [`RocksRecordStore`]: `RocksDB` with one column family per collection
//!   plus index column families for every owner lookup (feature
//!   `rocksdb-backend`, enabled by default)
//!
//! # Example
//!
//! ```no_run
//! use classroom_core::{Course, CourseId, UserId};
//! use classroom_store::{MemoryRecordStore, RecordStore};
//!
//! # async fn example() -> classroom_store::Result<()> {
//! let store = MemoryRecordStore::new();
//! let course = Course::new(CourseId::generate(), "Intro", "CS-101", UserId::generate());
//! store.put_course(&course).await?;
//!
//! let assignments = store.list_assignments_by_course(&course.id).await?;
//! assert!(assignments.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryRecordStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksRecordStore;

use async_trait::async_trait;
use classroom_core::{
    Assignment, AssignmentId, Collection, CommunityComment, CommunityPost, Course, CourseId,
    Interaction, PeerResponse, PostId, RosterEntry, Submission, UserId,
};

/// Outcome of a conditional roster write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterWrite {
    /// The roster was replaced.
    Applied {
        /// The course's roster version after the write.
        version: u64,
        /// The new roster length.
        student_count: usize,
    },
    /// The roster changed since it was read; nothing was written.
    Conflict {
        /// The version currently stored.
        current_version: u64,
    },
    /// The course does not exist.
    Missing,
}

/// The storage trait defining all record operations.
///
/// Lookups by owner are exact-match: a course `course_1` never matches
/// records owned by `course_10`. Deletes are idempotent.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // =========================================================================
    // Courses
    // =========================================================================

    /// Insert or replace a course record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_course(&self, course: &Course) -> Result<()>;

    /// Get a course by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_course(&self, course_id: &CourseId) -> Result<Option<Course>>;

    /// Replace a course's roster if its roster version still equals
    /// `expected_version`.
    ///
    /// On success the version is incremented and `student_count` is set to
    /// the new roster length, in the same write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn update_roster(
        &self,
        course_id: &CourseId,
        expected_version: u64,
        roster: Vec<RosterEntry>,
    ) -> Result<RosterWrite>;

    // =========================================================================
    // Assignments
    // =========================================================================

    /// Insert or replace an assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_assignment(&self, assignment: &Assignment) -> Result<()>;

    /// List the assignments owned by a course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_assignments_by_course(&self, course_id: &CourseId) -> Result<Vec<Assignment>>;

    // =========================================================================
    // Submissions
    // =========================================================================

    /// Insert or replace a submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_submission(&self, submission: &Submission) -> Result<()>;

    /// List the submissions to an assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_submissions_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<Submission>>;

    /// List every submission recorded against a course, including ones
    /// whose assignment no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_submissions_by_course(&self, course_id: &CourseId) -> Result<Vec<Submission>>;

    /// List a student's submissions within one course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_submissions_by_student(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Submission>>;

    // =========================================================================
    // Peer Responses
    // =========================================================================

    /// Insert or replace a peer response.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_peer_response(&self, response: &PeerResponse) -> Result<()>;

    /// List the peer responses written against an assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_peer_responses_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<PeerResponse>>;

    /// List every peer response a reviewer has written, in any course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_peer_responses_by_reviewer(
        &self,
        reviewer_id: &UserId,
    ) -> Result<Vec<PeerResponse>>;

    // =========================================================================
    // Community
    // =========================================================================

    /// Insert or replace a community post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_post(&self, post: &CommunityPost) -> Result<()>;

    /// List the posts on a course's community board.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_posts_by_course(&self, course_id: &CourseId) -> Result<Vec<CommunityPost>>;

    /// Insert or replace a community comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_comment(&self, comment: &CommunityComment) -> Result<()>;

    /// List the comments on a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_comments_by_post(&self, post_id: &PostId) -> Result<Vec<CommunityComment>>;

    /// List every comment a user has written, on any post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_comments_by_author(&self, author_id: &UserId)
        -> Result<Vec<CommunityComment>>;

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Insert or replace an interaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_interaction(&self, interaction: &Interaction) -> Result<()>;

    /// List every interaction by a user, in any course.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_interactions_by_user(&self, user_id: &UserId) -> Result<Vec<Interaction>>;

    /// List the interactions targeting a piece of content.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_interactions_by_target(&self, target_id: &str) -> Result<Vec<Interaction>>;

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Check whether a record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn exists(&self, collection: Collection, id: &str) -> Result<bool>;

    /// Delete a record and its index entries.
    ///
    /// Returns `false` if the record was already absent; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool>;
}
