//! Record types stored in the record store.
//!
//! Dependent records (assignments, submissions, ...) are created by other
//! parts of the platform. The store does not enforce the ownership links
//! between them; the cascade engine is the only place that follows them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locator::resolve_media_key;
use crate::{
    AssignmentId, CommentId, CourseId, InteractionId, PeerResponseId, PostId, SubmissionId,
    UserId,
};

/// A course with its ordered enrollment roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course identifier.
    pub id: CourseId,

    /// Display title.
    pub title: String,

    /// Short course code (e.g. `"CS-101"`).
    pub code: String,

    /// The instructor who owns the course.
    pub instructor_id: UserId,

    /// Enrolled students, in enrollment order. Unique by student.
    pub roster: Vec<RosterEntry>,

    /// Number of enrolled students, kept in step with `roster`.
    pub student_count: usize,

    /// Incremented on every roster write; used for conditional updates.
    #[serde(default)]
    pub roster_version: u64,

    /// When the course was created.
    pub created_at: DateTime<Utc>,

    /// When the course was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Create a course with an empty roster.
    #[must_use]
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        code: impl Into<String>,
        instructor_id: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            code: code.into(),
            instructor_id,
            roster: Vec::new(),
            student_count: 0,
            roster_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether a student is on the roster.
    #[must_use]
    pub fn is_enrolled(&self, student_id: &UserId) -> bool {
        self.roster.iter().any(|e| &e.student_id == student_id)
    }

    /// Append a student to the roster.
    ///
    /// Bumps `roster_version`, so a conditional roster write based on the
    /// previous version no longer applies. Returns `false` without changes
    /// if the student is already enrolled.
    pub fn enroll(&mut self, student_id: UserId) -> bool {
        if self.is_enrolled(&student_id) {
            return false;
        }
        let now = Utc::now();
        self.roster.push(RosterEntry {
            student_id,
            enrolled_at: now,
        });
        self.student_count = self.roster.len();
        self.roster_version += 1;
        self.updated_at = now;
        true
    }

    /// Take the roster from `stored` if it is newer than this copy's.
    ///
    /// Stores call this before replacing a course so a write built from a
    /// stale read cannot roll back a roster change made since.
    pub fn keep_newer_roster(&mut self, stored: &Course) {
        if stored.roster_version > self.roster_version {
            self.roster.clone_from(&stored.roster);
            self.student_count = stored.student_count;
            self.roster_version = stored.roster_version;
        }
    }
}

/// One student's membership in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The enrolled student.
    pub student_id: UserId,

    /// When the student enrolled.
    pub enrolled_at: DateTime<Utc>,
}

/// Assignment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Not yet visible to students.
    Draft,
    /// Open for submissions.
    Published,
    /// No longer accepting submissions.
    Closed,
}

/// An assignment belonging to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assignment identifier.
    pub id: AssignmentId,

    /// Owning course.
    pub course_id: CourseId,

    /// Display title.
    pub title: String,

    /// Due date, if any.
    pub due_at: Option<DateTime<Utc>>,

    /// Lifecycle status.
    pub status: AssignmentStatus,

    /// When the assignment was created.
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Create a published assignment with no due date.
    #[must_use]
    pub fn new(course_id: CourseId, title: impl Into<String>) -> Self {
        Self {
            id: AssignmentId::generate(),
            course_id,
            title: title.into(),
            due_at: None,
            status: AssignmentStatus::Published,
            created_at: Utc::now(),
        }
    }
}

/// A student's submission to an assignment.
///
/// A submission may reference up to two blob objects: the primary video and
/// its thumbnail. Each is described by a display URL and, for submissions
/// created since keys were stored explicitly, the blob key itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Submission identifier.
    pub id: SubmissionId,

    /// Owning assignment.
    pub assignment_id: AssignmentId,

    /// Owning course.
    pub course_id: CourseId,

    /// Submitting student.
    pub student_id: UserId,

    /// Display URL (or legacy stored key) of the primary video.
    #[serde(default)]
    pub video_url: Option<String>,

    /// Blob key of the primary video.
    #[serde(default)]
    pub video_key: Option<String>,

    /// Display URL (or legacy stored key) of the thumbnail.
    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Blob key of the thumbnail.
    #[serde(default)]
    pub thumbnail_key: Option<String>,

    /// Set when the media lives on a third-party host (e.g. a shared video
    /// link); such media is never deleted from the blob store.
    #[serde(default)]
    pub externally_hosted: bool,

    /// Grade, if graded.
    pub grade: Option<f32>,

    /// Instructor feedback, if any.
    pub feedback: Option<String>,

    /// When the submission was made.
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Create an ungraded submission with no media.
    #[must_use]
    pub fn new(assignment_id: AssignmentId, course_id: CourseId, student_id: UserId) -> Self {
        Self {
            id: SubmissionId::generate(),
            assignment_id,
            course_id,
            student_id,
            video_url: None,
            video_key: None,
            thumbnail_url: None,
            thumbnail_key: None,
            externally_hosted: false,
            grade: None,
            feedback: None,
            submitted_at: Utc::now(),
        }
    }

    /// Blob keys of the media this submission references in `bucket`.
    ///
    /// Returns at most two keys (video, thumbnail), skipping absent and
    /// externally hosted media.
    #[must_use]
    pub fn media_keys(&self, bucket: &str) -> Vec<String> {
        [
            (self.video_key.as_deref(), self.video_url.as_deref()),
            (self.thumbnail_key.as_deref(), self.thumbnail_url.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, url)| resolve_media_key(key, url, bucket, self.externally_hosted))
        .collect()
    }
}

/// A peer's written response to another student's submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerResponse {
    /// Peer response identifier.
    pub id: PeerResponseId,

    /// The reviewing student (author of the response).
    pub reviewer_id: UserId,

    /// The assignment the reviewed submission belongs to.
    pub assignment_id: AssignmentId,

    /// The reviewed submission (video).
    pub submission_id: SubmissionId,

    /// Response text.
    pub content: String,

    /// When the response was written.
    pub created_at: DateTime<Utc>,
}

impl PeerResponse {
    /// Create a peer response.
    #[must_use]
    pub fn new(
        reviewer_id: UserId,
        assignment_id: AssignmentId,
        submission_id: SubmissionId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: PeerResponseId::generate(),
            reviewer_id,
            assignment_id,
            submission_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A post on a course's community board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPost {
    /// Post identifier.
    pub id: PostId,

    /// Owning course.
    pub course_id: CourseId,

    /// Post author.
    pub author_id: UserId,

    /// Post body.
    pub content: String,

    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

impl CommunityPost {
    /// Create a post.
    #[must_use]
    pub fn new(course_id: CourseId, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: PostId::generate(),
            course_id,
            author_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A comment on a community post.
///
/// Comments carry no course reference; they belong to a course through
/// their post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityComment {
    /// Comment identifier.
    pub id: CommentId,

    /// The post being commented on.
    pub post_id: PostId,

    /// Comment author.
    pub author_id: UserId,

    /// Comment body.
    pub content: String,

    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

impl CommunityComment {
    /// Create a comment.
    #[must_use]
    pub fn new(post_id: PostId, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: CommentId::generate(),
            post_id,
            author_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Kind of user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// A like.
    Like,
    /// A star rating.
    Rating,
    /// A view.
    View,
}

/// A user's interaction with a piece of content (submission video or post).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Interaction identifier.
    pub id: InteractionId,

    /// The acting user.
    pub user_id: UserId,

    /// Identifier of the target content (a submission or post id).
    pub target_id: String,

    /// Interaction kind.
    pub kind: InteractionKind,

    /// Rating value, for `InteractionKind::Rating`.
    #[serde(default)]
    pub rating: Option<u8>,

    /// When the interaction happened.
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// Create an interaction.
    #[must_use]
    pub fn new(user_id: UserId, target_id: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            id: InteractionId::generate(),
            user_id,
            target_id: target_id.into(),
            kind,
            rating: None,
            created_at: Utc::now(),
        }
    }
}
