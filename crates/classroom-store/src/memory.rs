//! In-memory storage implementation.
//!
//! This module provides the `MemoryRecordStore` implementation of the
//! `RecordStore` trait. Records are kept in ordered maps so listings come back
//! in identifier order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use classroom_core::{
    Assignment, AssignmentId, Collection, CommentId, CommunityComment, CommunityPost, Course,
    CourseId, Interaction, InteractionId, PeerResponse, PeerResponseId, PostId, RosterEntry,
    Submission, SubmissionId, UserId,
};

use crate::error::Result;
use crate::{RecordStore, RosterWrite};

#[derive(Debug, Default)]
struct Tables {
    courses: BTreeMap<CourseId, Course>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    submissions: BTreeMap<SubmissionId, Submission>,
    peer_responses: BTreeMap<PeerResponseId, PeerResponse>,
    posts: BTreeMap<PostId, CommunityPost>,
    comments: BTreeMap<CommentId, CommunityComment>,
    interactions: BTreeMap<InteractionId, Interaction>,
}

/// Process-local record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all collections.
    pub async fn len(&self) -> usize {
        let t = self.tables.read().await;
        t.courses.len()
            + t.assignments.len()
            + t.submissions.len()
            + t.peer_responses.len()
            + t.posts.len()
            + t.comments.len()
            + t.interactions.len()
    }

    /// Whether the store holds no records at all.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Remove `id` from `map` if it parses as the map's key type.
fn remove_by_str<K, V>(map: &mut BTreeMap<K, V>, id: &str) -> bool
where
    K: Ord + std::str::FromStr,
{
    id.parse::<K>()
        .ok()
        .is_some_and(|key| map.remove(&key).is_some())
}

fn contains_str<K, V>(map: &BTreeMap<K, V>, id: &str) -> bool
where
    K: Ord + std::str::FromStr,
{
    id.parse::<K>().ok().is_some_and(|key| map.contains_key(&key))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put_course(&self, course: &Course) -> Result<()> {
        let mut t = self.tables.write().await;
        let mut course = course.clone();
        if let Some(stored) = t.courses.get(&course.id) {
            course.keep_newer_roster(stored);
        }
        t.courses.insert(course.id.clone(), course);
        Ok(())
    }

    async fn get_course(&self, course_id: &CourseId) -> Result<Option<Course>> {
        Ok(self.tables.read().await.courses.get(course_id).cloned())
    }

    async fn update_roster(
        &self,
        course_id: &CourseId,
        expected_version: u64,
        roster: Vec<RosterEntry>,
    ) -> Result<RosterWrite> {
        let mut t = self.tables.write().await;
        let Some(course) = t.courses.get_mut(course_id) else {
            return Ok(RosterWrite::Missing);
        };

        if course.roster_version != expected_version {
            return Ok(RosterWrite::Conflict {
                current_version: course.roster_version,
            });
        }

        course.student_count = roster.len();
        course.roster = roster;
        course.roster_version += 1;
        course.updated_at = chrono::Utc::now();

        Ok(RosterWrite::Applied {
            version: course.roster_version,
            student_count: course.student_count,
        })
    }

    async fn put_assignment(&self, assignment: &Assignment) -> Result<()> {
        let mut t = self.tables.write().await;
        t.assignments
            .insert(assignment.id.clone(), assignment.clone());
        Ok(())
    }

    async fn list_assignments_by_course(&self, course_id: &CourseId) -> Result<Vec<Assignment>> {
        let t = self.tables.read().await;
        Ok(t.assignments
            .values()
            .filter(|a| &a.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn put_submission(&self, submission: &Submission) -> Result<()> {
        let mut t = self.tables.write().await;
        t.submissions
            .insert(submission.id.clone(), submission.clone());
        Ok(())
    }

    async fn list_submissions_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<Submission>> {
        let t = self.tables.read().await;
        Ok(t.submissions
            .values()
            .filter(|s| &s.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn list_submissions_by_course(&self, course_id: &CourseId) -> Result<Vec<Submission>> {
        let t = self.tables.read().await;
        Ok(t.submissions
            .values()
            .filter(|s| &s.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn list_submissions_by_student(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Submission>> {
        let t = self.tables.read().await;
        Ok(t.submissions
            .values()
            .filter(|s| &s.student_id == student_id && &s.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn put_peer_response(&self, response: &PeerResponse) -> Result<()> {
        let mut t = self.tables.write().await;
        t.peer_responses
            .insert(response.id.clone(), response.clone());
        Ok(())
    }

    async fn list_peer_responses_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<PeerResponse>> {
        let t = self.tables.read().await;
        Ok(t.peer_responses
            .values()
            .filter(|r| &r.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn list_peer_responses_by_reviewer(
        &self,
        reviewer_id: &UserId,
    ) -> Result<Vec<PeerResponse>> {
        let t = self.tables.read().await;
        Ok(t.peer_responses
            .values()
            .filter(|r| &r.reviewer_id == reviewer_id)
            .cloned()
            .collect())
    }

    async fn put_post(&self, post: &CommunityPost) -> Result<()> {
        let mut t = self.tables.write().await;
        t.posts.insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn list_posts_by_course(&self, course_id: &CourseId) -> Result<Vec<CommunityPost>> {
        let t = self.tables.read().await;
        Ok(t.posts
            .values()
            .filter(|p| &p.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn put_comment(&self, comment: &CommunityComment) -> Result<()> {
        let mut t = self.tables.write().await;
        t.comments.insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    async fn list_comments_by_post(&self, post_id: &PostId) -> Result<Vec<CommunityComment>> {
        let t = self.tables.read().await;
        Ok(t.comments
            .values()
            .filter(|c| &c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn list_comments_by_author(
        &self,
        author_id: &UserId,
    ) -> Result<Vec<CommunityComment>> {
        let t = self.tables.read().await;
        Ok(t.comments
            .values()
            .filter(|c| &c.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn put_interaction(&self, interaction: &Interaction) -> Result<()> {
        let mut t = self.tables.write().await;
        t.interactions
            .insert(interaction.id.clone(), interaction.clone());
        Ok(())
    }

    async fn list_interactions_by_user(&self, user_id: &UserId) -> Result<Vec<Interaction>> {
        let t = self.tables.read().await;
        Ok(t.interactions
            .values()
            .filter(|i| &i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_interactions_by_target(&self, target_id: &str) -> Result<Vec<Interaction>> {
        let t = self.tables.read().await;
        Ok(t.interactions
            .values()
            .filter(|i| i.target_id == target_id)
            .cloned()
            .collect())
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool> {
        let t = self.tables.read().await;
        let found = match collection {
            Collection::Courses => contains_str(&t.courses, id),
            Collection::Assignments => contains_str(&t.assignments, id),
            Collection::Submissions => contains_str(&t.submissions, id),
            Collection::PeerResponses => contains_str(&t.peer_responses, id),
            Collection::CommunityPosts => contains_str(&t.posts, id),
            Collection::CommunityComments => contains_str(&t.comments, id),
            Collection::Interactions => contains_str(&t.interactions, id),
        };
        Ok(found)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let mut t = self.tables.write().await;
        let removed = match collection {
            Collection::Courses => remove_by_str(&mut t.courses, id),
            Collection::Assignments => remove_by_str(&mut t.assignments, id),
            Collection::Submissions => remove_by_str(&mut t.submissions, id),
            Collection::PeerResponses => remove_by_str(&mut t.peer_responses, id),
            Collection::CommunityPosts => remove_by_str(&mut t.posts, id),
            Collection::CommunityComments => remove_by_str(&mut t.comments, id),
            Collection::Interactions => remove_by_str(&mut t.interactions, id),
        };
        Ok(removed)
    }
}
