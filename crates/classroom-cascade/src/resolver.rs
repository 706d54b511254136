//! Dependency resolution.
//!
//! Finds every record that hangs off a cascade root. Resolution only reads;
//! a failed lookup is noted in [`Dependents::errors`] and the rest of the
//! lookups still run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::future::Future;

use classroom_core::{
    Assignment, Collection, CommunityComment, CommunityPost, CourseId, Interaction, PeerResponse,
    PostId, Submission, UserId,
};
use classroom_store::RecordStore;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Records that depend on a cascade root.
#[derive(Debug, Default)]
pub struct Dependents {
    /// Assignments owned by the course.
    pub assignments: Vec<Assignment>,
    /// Submissions in scope.
    pub submissions: Vec<Submission>,
    /// Peer responses in scope.
    pub peer_responses: Vec<PeerResponse>,
    /// Community posts in scope.
    pub posts: Vec<CommunityPost>,
    /// Community comments in scope.
    pub comments: Vec<CommunityComment>,
    /// Interactions in scope.
    pub interactions: Vec<Interaction>,
    /// Lookups that failed.
    pub errors: Vec<String>,
}

impl Dependents {
    /// Unique blob keys referenced by the submissions, sorted.
    #[must_use]
    pub fn blob_keys(&self, bucket: &str) -> Vec<String> {
        self.submissions
            .iter()
            .flat_map(|s| s.media_keys(bucket))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// IDs of the records in one collection.
    ///
    /// The root collection (`Courses`) is never part of the dependents.
    #[must_use]
    pub fn ids(&self, collection: Collection) -> Vec<String> {
        match collection {
            Collection::Courses => Vec::new(),
            Collection::Assignments => self.assignments.iter().map(|a| a.id.to_string()).collect(),
            Collection::Submissions => self.submissions.iter().map(|s| s.id.to_string()).collect(),
            Collection::PeerResponses => {
                self.peer_responses.iter().map(|p| p.id.to_string()).collect()
            }
            Collection::CommunityPosts => self.posts.iter().map(|p| p.id.to_string()).collect(),
            Collection::CommunityComments => {
                self.comments.iter().map(|c| c.id.to_string()).collect()
            }
            Collection::Interactions => {
                self.interactions.iter().map(|i| i.id.to_string()).collect()
            }
        }
    }

    /// Number of dependent records per collection.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<Collection, usize> {
        BTreeMap::from([
            (Collection::Assignments, self.assignments.len()),
            (Collection::Submissions, self.submissions.len()),
            (Collection::PeerResponses, self.peer_responses.len()),
            (Collection::CommunityPosts, self.posts.len()),
            (Collection::CommunityComments, self.comments.len()),
            (Collection::Interactions, self.interactions.len()),
        ])
    }

    /// Total number of dependent records.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts().values().sum()
    }

    fn note<T>(
        &mut self,
        what: &str,
        owner: impl Display,
        result: classroom_store::Result<T>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(owner = %owner, error = %e, "Dependency lookup failed");
                self.errors.push(format!("failed to list {what} for {owner}: {e}"));
                None
            }
        }
    }

    /// Sort every collection by id and drop records found twice.
    fn sort(&mut self) {
        macro_rules! sort_unique {
            ($($field:ident),*) => {$(
                self.$field.sort_by(|a, b| a.id.cmp(&b.id));
                self.$field.dedup_by(|a, b| a.id == b.id);
            )*};
        }
        sort_unique!(assignments, submissions, peer_responses, posts, comments, interactions);
    }
}

/// Run one lookup per owner with at most `limit` in flight.
async fn fan_out<O, T, F, Fut>(
    owners: Vec<O>,
    limit: usize,
    fetch: F,
) -> Vec<(O, classroom_store::Result<Vec<T>>)>
where
    O: Clone,
    F: Fn(O) -> Fut,
    Fut: Future<Output = classroom_store::Result<Vec<T>>>,
{
    stream::iter(owners)
        .map(|owner| {
            let lookup = fetch(owner.clone());
            async move { (owner, lookup.await) }
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}

/// Read-only dependency resolver.
pub struct Resolver<'a> {
    records: &'a dyn RecordStore,
    concurrency: usize,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a record store.
    #[must_use]
    pub fn new(records: &'a dyn RecordStore, concurrency: usize) -> Self {
        Self {
            records,
            concurrency: concurrency.max(1),
        }
    }

    /// Everything owned by a course.
    ///
    /// Assignments and posts are found by course; submissions by course and
    /// through the assignments, so a submission whose assignment is already
    /// gone is still found; peer responses through the assignments; comments
    /// through the posts; interactions through the submissions and posts
    /// they target.
    pub async fn resolve_course(&self, course_id: &CourseId) -> Dependents {
        let mut deps = Dependents::default();

        let (assignments, posts, course_submissions) = futures::join!(
            self.records.list_assignments_by_course(course_id),
            self.records.list_posts_by_course(course_id),
            self.records.list_submissions_by_course(course_id),
        );
        deps.assignments = deps.note("assignments", course_id, assignments).unwrap_or_default();
        deps.posts = deps.note("community posts", course_id, posts).unwrap_or_default();
        deps.submissions = deps
            .note("submissions", course_id, course_submissions)
            .unwrap_or_default();

        let assignment_ids: Vec<_> = deps.assignments.iter().map(|a| a.id.clone()).collect();
        let post_ids: Vec<_> = deps.posts.iter().map(|p| p.id.clone()).collect();

        let (submissions, responses, comments) = futures::join!(
            fan_out(assignment_ids.clone(), self.concurrency, |id| async move {
                self.records.list_submissions_by_assignment(&id).await
            }),
            fan_out(assignment_ids, self.concurrency, |id| async move {
                self.records.list_peer_responses_by_assignment(&id).await
            }),
            self.comments_on(post_ids),
        );
        for (assignment_id, result) in submissions {
            if let Some(found) = deps.note("submissions", &assignment_id, result) {
                deps.submissions.extend(found);
            }
        }
        for (assignment_id, result) in responses {
            if let Some(found) = deps.note("peer responses", &assignment_id, result) {
                deps.peer_responses.extend(found);
            }
        }
        for (post_id, result) in comments {
            if let Some(found) = deps.note("community comments", &post_id, result) {
                deps.comments.extend(found);
            }
        }

        deps.sort();
        let targets: Vec<String> = deps
            .submissions
            .iter()
            .map(|s| s.id.to_string())
            .chain(deps.posts.iter().map(|p| p.id.to_string()))
            .collect();
        let interactions = fan_out(targets, self.concurrency, |target| async move {
            self.records.list_interactions_by_target(&target).await
        })
        .await;
        for (target, result) in interactions {
            if let Some(found) = deps.note("interactions", &target, result) {
                deps.interactions.extend(found);
            }
        }

        deps.sort();
        debug!(
            course_id = %course_id,
            assignments = deps.assignments.len(),
            submissions = deps.submissions.len(),
            peer_responses = deps.peer_responses.len(),
            posts = deps.posts.len(),
            comments = deps.comments.len(),
            interactions = deps.interactions.len(),
            errors = deps.errors.len(),
            "Resolved course dependents"
        );
        deps
    }

    /// One student's footprint in a course.
    ///
    /// Submissions and posts are limited to the course. Peer responses and
    /// interactions are the student's everywhere. Comments are the student's
    /// comments on course posts plus every comment on the student's posts.
    pub async fn resolve_student(&self, course_id: &CourseId, student_id: &UserId) -> Dependents {
        let mut deps = Dependents::default();

        let (submissions, responses, posts, interactions, authored) = futures::join!(
            self.records.list_submissions_by_student(student_id, course_id),
            self.records.list_peer_responses_by_reviewer(student_id),
            self.records.list_posts_by_course(course_id),
            self.records.list_interactions_by_user(student_id),
            self.records.list_comments_by_author(student_id),
        );
        deps.submissions = deps.note("submissions", student_id, submissions).unwrap_or_default();
        deps.peer_responses = deps
            .note("peer responses", student_id, responses)
            .unwrap_or_default();
        deps.interactions = deps
            .note("interactions", student_id, interactions)
            .unwrap_or_default();
        let course_posts = deps.note("community posts", course_id, posts).unwrap_or_default();
        let course_post_ids: BTreeSet<PostId> = course_posts.iter().map(|p| p.id.clone()).collect();
        deps.posts = course_posts
            .into_iter()
            .filter(|p| p.author_id == *student_id)
            .collect();

        if let Some(found) = deps.note("community comments", student_id, authored) {
            deps.comments.extend(
                found
                    .into_iter()
                    .filter(|c| course_post_ids.contains(&c.post_id)),
            );
        }

        let own_posts: Vec<PostId> = deps.posts.iter().map(|p| p.id.clone()).collect();
        for (post_id, result) in self.comments_on(own_posts).await {
            if let Some(found) = deps.note("community comments", &post_id, result) {
                deps.comments.extend(found);
            }
        }

        deps.sort();
        debug!(
            course_id = %course_id,
            student_id = %student_id,
            submissions = deps.submissions.len(),
            peer_responses = deps.peer_responses.len(),
            posts = deps.posts.len(),
            comments = deps.comments.len(),
            interactions = deps.interactions.len(),
            errors = deps.errors.len(),
            "Resolved student dependents"
        );
        deps
    }

    async fn comments_on(
        &self,
        post_ids: Vec<PostId>,
    ) -> Vec<(PostId, classroom_store::Result<Vec<CommunityComment>>)> {
        fan_out(post_ids, self.concurrency, |id| async move {
            self.records.list_comments_by_post(&id).await
        })
        .await
    }
}
