//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.
//! Primary column families hold CBOR-encoded records keyed by record id.
//! Index column families hold empty values keyed by `owner || 0x00 || id`.

use classroom_core::Collection;

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Course records, keyed by `course_id`.
    pub const COURSES: &str = "courses";

    /// Assignment records, keyed by `assignment_id`.
    pub const ASSIGNMENTS: &str = "assignments";

    /// Index: assignments by course.
    pub const ASSIGNMENTS_BY_COURSE: &str = "assignments_by_course";

    /// Submission records, keyed by `submission_id`.
    pub const SUBMISSIONS: &str = "submissions";

    /// Index: submissions by assignment.
    pub const SUBMISSIONS_BY_ASSIGNMENT: &str = "submissions_by_assignment";

    /// Index: submissions by course.
    pub const SUBMISSIONS_BY_COURSE: &str = "submissions_by_course";

    /// Index: submissions by `student_id || course_id`.
    pub const SUBMISSIONS_BY_STUDENT: &str = "submissions_by_student";

    /// Peer response records, keyed by `peer_response_id`.
    pub const PEER_RESPONSES: &str = "peer_responses";

    /// Index: peer responses by assignment.
    pub const PEER_RESPONSES_BY_ASSIGNMENT: &str = "peer_responses_by_assignment";

    /// Index: peer responses by reviewer.
    pub const PEER_RESPONSES_BY_REVIEWER: &str = "peer_responses_by_reviewer";

    /// Community post records, keyed by `post_id`.
    pub const POSTS: &str = "community_posts";

    /// Index: posts by course.
    pub const POSTS_BY_COURSE: &str = "community_posts_by_course";

    /// Community comment records, keyed by `comment_id`.
    pub const COMMENTS: &str = "community_comments";

    /// Index: comments by post.
    pub const COMMENTS_BY_POST: &str = "community_comments_by_post";

    /// Index: comments by author.
    pub const COMMENTS_BY_AUTHOR: &str = "community_comments_by_author";

    /// Interaction records, keyed by `interaction_id`.
    pub const INTERACTIONS: &str = "interactions";

    /// Index: interactions by acting user.
    pub const INTERACTIONS_BY_USER: &str = "interactions_by_user";

    /// Index: interactions by target content.
    pub const INTERACTIONS_BY_TARGET: &str = "interactions_by_target";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::COURSES,
        cf::ASSIGNMENTS,
        cf::ASSIGNMENTS_BY_COURSE,
        cf::SUBMISSIONS,
        cf::SUBMISSIONS_BY_ASSIGNMENT,
        cf::SUBMISSIONS_BY_COURSE,
        cf::SUBMISSIONS_BY_STUDENT,
        cf::PEER_RESPONSES,
        cf::PEER_RESPONSES_BY_ASSIGNMENT,
        cf::PEER_RESPONSES_BY_REVIEWER,
        cf::POSTS,
        cf::POSTS_BY_COURSE,
        cf::COMMENTS,
        cf::COMMENTS_BY_POST,
        cf::COMMENTS_BY_AUTHOR,
        cf::INTERACTIONS,
        cf::INTERACTIONS_BY_USER,
        cf::INTERACTIONS_BY_TARGET,
    ]
}

/// The primary column family of a collection.
#[must_use]
pub const fn primary_cf(collection: Collection) -> &'static str {
    match collection {
        Collection::Courses => cf::COURSES,
        Collection::Assignments => cf::ASSIGNMENTS,
        Collection::Submissions => cf::SUBMISSIONS,
        Collection::PeerResponses => cf::PEER_RESPONSES,
        Collection::CommunityPosts => cf::POSTS,
        Collection::CommunityComments => cf::COMMENTS,
        Collection::Interactions => cf::INTERACTIONS,
    }
}
