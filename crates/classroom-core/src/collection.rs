//! Record-store collections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A collection in the record store.
///
/// Every record type lives in exactly one collection. The cascade engine uses
/// the tag to route point deletes and to key per-collection counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Courses (the root of a course cascade).
    Courses,
    /// Assignments, owned by a course.
    Assignments,
    /// Submissions, owned by an assignment, a course and a student.
    Submissions,
    /// Peer responses, authored by a reviewer against an assignment.
    PeerResponses,
    /// Community posts, owned by a course.
    CommunityPosts,
    /// Community comments, owned by a post.
    CommunityComments,
    /// Interactions (likes, ratings, views) by a user on some content.
    Interactions,
}

impl Collection {
    /// All collections, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Courses,
        Self::Assignments,
        Self::Submissions,
        Self::PeerResponses,
        Self::CommunityPosts,
        Self::CommunityComments,
        Self::Interactions,
    ];

    /// The collection name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Assignments => "assignments",
            Self::Submissions => "submissions",
            Self::PeerResponses => "peer_responses",
            Self::CommunityPosts => "community_posts",
            Self::CommunityComments => "community_comments",
            Self::Interactions => "interactions",
        }
    }

    /// Singular, human-readable record label used in error messages.
    #[must_use]
    pub const fn record_label(self) -> &'static str {
        match self {
            Self::Courses => "course",
            Self::Assignments => "assignment",
            Self::Submissions => "submission",
            Self::PeerResponses => "peer response",
            Self::CommunityPosts => "community post",
            Self::CommunityComments => "community comment",
            Self::Interactions => "interaction",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
