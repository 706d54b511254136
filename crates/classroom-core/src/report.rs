//! Deletion reports.
//!
//! A cascade never raises runtime failures to its caller. Everything that
//! went wrong is written into the report's `errors` list and the report is
//! returned with `success: true`; callers distinguish a clean run from a
//! partial one through `status`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Collection, CourseId, UserId};

/// The root entity a cascade starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CascadeRoot {
    /// A whole course.
    Course {
        /// The course being deleted.
        course_id: CourseId,
    },
    /// One student's footprint within a course.
    StudentInCourse {
        /// The course the student is removed from.
        course_id: CourseId,
        /// The student being removed.
        student_id: UserId,
    },
}

impl CascadeRoot {
    /// The course this cascade is scoped to.
    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        match self {
            Self::Course { course_id } | Self::StudentInCourse { course_id, .. } => course_id,
        }
    }
}

/// Overall outcome of a cascade that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStatus {
    /// Every phase succeeded.
    Completed,
    /// All phases ran but at least one operation failed; see `errors`.
    CompletedWithWarnings,
}

impl CascadeStatus {
    /// Derive the status from the collected error list.
    #[must_use]
    pub fn from_errors(errors: &[String]) -> Self {
        if errors.is_empty() {
            Self::Completed
        } else {
            Self::CompletedWithWarnings
        }
    }
}

/// Report returned by a course deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDeletionReport {
    /// Always `true` for a cascade that started.
    pub success: bool,
    /// Whether any operation failed.
    pub status: CascadeStatus,
    /// The deleted course.
    pub course_id: CourseId,
    /// Whether the course record itself was removed.
    pub course_deleted: bool,
    /// Assignments deleted.
    pub assignments: usize,
    /// Submissions deleted.
    pub submissions: usize,
    /// Peer responses deleted.
    pub peer_responses: usize,
    /// Community posts deleted.
    pub community_posts: usize,
    /// Community comments deleted.
    pub community_comments: usize,
    /// Interactions deleted.
    pub interactions: usize,
    /// Blob objects deleted.
    pub videos_deleted: usize,
    /// Blob objects that could not be deleted.
    pub videos_failed: usize,
    /// Human-readable description of every failure.
    pub errors: Vec<String>,
}

/// Report returned by a student removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRemovalReport {
    /// Always `true` for a cascade that started.
    pub success: bool,
    /// Whether any operation failed.
    pub status: CascadeStatus,
    /// The course the student was removed from.
    pub course_id: CourseId,
    /// The removed student.
    pub student_id: UserId,
    /// Submissions deleted.
    pub submissions_deleted: usize,
    /// Peer responses deleted.
    pub peer_responses_deleted: usize,
    /// Community posts deleted.
    pub community_posts_deleted: usize,
    /// Community comments deleted.
    pub community_comments_deleted: usize,
    /// Interactions deleted.
    pub interactions_deleted: usize,
    /// Blob objects deleted.
    pub s3_objects_deleted: usize,
    /// Blob objects that could not be deleted.
    pub s3_objects_failed: usize,
    /// Roster length after removal, if the roster write went through.
    pub roster_size: Option<usize>,
    /// Human-readable description of every failure.
    pub errors: Vec<String>,
}

/// What a cascade would delete, computed without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadePlan {
    /// The cascade root.
    pub root: CascadeRoot,
    /// Number of dependent records per collection.
    pub counts: BTreeMap<Collection, usize>,
    /// Unique blob keys that would be deleted.
    pub blob_keys: Vec<String>,
    /// Lookups that failed while building the plan.
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_errors() {
        assert_eq!(CascadeStatus::from_errors(&[]), CascadeStatus::Completed);
        assert_eq!(
            CascadeStatus::from_errors(&["boom".into()]),
            CascadeStatus::CompletedWithWarnings
        );
    }

    #[test]
    fn course_report_uses_camel_case_fields() {
        let report = CourseDeletionReport {
            success: true,
            status: CascadeStatus::Completed,
            course_id: CourseId::new("course_001").unwrap(),
            course_deleted: true,
            assignments: 2,
            submissions: 3,
            peer_responses: 1,
            community_posts: 0,
            community_comments: 0,
            interactions: 0,
            videos_deleted: 2,
            videos_failed: 0,
            errors: vec![],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["courseId"], "course_001");
        assert_eq!(json["peerResponses"], 1);
        assert_eq!(json["videosDeleted"], 2);
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn root_is_tagged_by_kind() {
        let root = CascadeRoot::StudentInCourse {
            course_id: CourseId::new("c").unwrap(),
            student_id: UserId::new("s").unwrap(),
        };
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["kind"], "student_in_course");
        assert_eq!(root.course_id().as_str(), "c");
    }
}
