//! Course deletion integration tests.

mod common;

use classroom_core::{CascadeStatus, Collection, Submission};
use classroom_store::RecordStore;
use common::{uid, RecordingBlobStore, TestHarness};

#[tokio::test]
async fn course_with_submissions_and_reviews() {
    let h = TestHarness::new();
    let course = h.course("course_bio", &["user_a", "user_b"]).await;
    let first = h.assignment(&course.id).await;
    let second = h.assignment(&course.id).await;

    let keyed = h
        .submission(&first, "user_a", Some("videos/course_bio/user_a/intro.mp4"))
        .await;
    h.submission(&second, "user_b", Some("videos/course_bio/user_b/cells.mp4"))
        .await;
    h.external_submission(&second, "user_a").await;
    h.peer_response("user_b", &keyed).await;

    let report = h.engine.delete_course("course_bio").await.unwrap();

    assert!(report.success);
    assert_eq!(report.status, CascadeStatus::Completed);
    assert!(report.course_deleted);
    assert_eq!(report.assignments, 2);
    assert_eq!(report.submissions, 3);
    assert_eq!(report.peer_responses, 1);
    assert_eq!(report.videos_deleted, 2);
    assert_eq!(report.videos_failed, 0);
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
    assert!(!h.exists(Collection::Courses, "course_bio").await);
}

#[tokio::test]
async fn second_deletion_finds_nothing() {
    let h = TestHarness::new();
    let course = h.course("course_1", &[]).await;
    let assignment = h.assignment(&course.id).await;
    h.submission(&assignment, "user_a", Some("videos/a.mp4")).await;

    let first = h.engine.delete_course("course_1").await.unwrap();
    assert_eq!(first.submissions, 1);

    let second = h.engine.delete_course("course_1").await.unwrap();

    assert!(second.success);
    assert!(!second.course_deleted);
    assert_eq!(second.assignments, 0);
    assert_eq!(second.submissions, 0);
    assert_eq!(second.videos_deleted, 0);
    assert_eq!(second.errors, vec!["course course_1 not found".to_string()]);
    assert_eq!(second.status, CascadeStatus::CompletedWithWarnings);
}

#[tokio::test]
async fn missing_course_still_cleans_up_dependents() {
    let h = TestHarness::new();
    let orphan_course: classroom_core::CourseId = "course_gone".parse().unwrap();
    let assignment = h.assignment(&orphan_course).await;
    let submission = h.submission(&assignment, "user_a", None).await;

    let report = h.engine.delete_course("course_gone").await.unwrap();

    assert_eq!(report.assignments, 1);
    assert_eq!(report.submissions, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(!h.exists(Collection::Submissions, &submission.id).await);
}

#[tokio::test]
async fn no_dependent_survives() {
    let h = TestHarness::new();
    let course = h.course("course_1", &["user_a", "user_b"]).await;
    let other = h.course("course_10", &["user_a"]).await;

    let assignment = h.assignment(&course.id).await;
    let submission = h.submission(&assignment, "user_a", Some("videos/1.mp4")).await;
    let response = h.peer_response("user_b", &submission).await;
    let post = h.post(&course.id, "user_a").await;
    let comment = h.comment(&post, "user_b").await;
    let like_on_submission = h.interaction("user_b", submission.id.as_str()).await;
    let like_on_post = h.interaction("user_a", post.id.as_str()).await;

    let kept_assignment = h.assignment(&other.id).await;
    let kept_submission = h.submission(&kept_assignment, "user_a", Some("videos/10.mp4")).await;
    let kept_post = h.post(&other.id, "user_a").await;
    let kept_like = h.interaction("user_a", kept_submission.id.as_str()).await;

    let report = h.engine.delete_course("course_1").await.unwrap();

    assert_eq!(report.community_posts, 1);
    assert_eq!(report.community_comments, 1);
    assert_eq!(report.interactions, 2);
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);

    assert!(!h.exists(Collection::Assignments, &assignment.id).await);
    assert!(!h.exists(Collection::Submissions, &submission.id).await);
    assert!(!h.exists(Collection::PeerResponses, &response.id).await);
    assert!(!h.exists(Collection::CommunityPosts, &post.id).await);
    assert!(!h.exists(Collection::CommunityComments, &comment.id).await);
    assert!(!h.exists(Collection::Interactions, &like_on_submission.id).await);
    assert!(!h.exists(Collection::Interactions, &like_on_post.id).await);

    assert!(h.exists(Collection::Courses, "course_10").await);
    assert!(h.exists(Collection::Assignments, &kept_assignment.id).await);
    assert!(h.exists(Collection::Submissions, &kept_submission.id).await);
    assert!(h.exists(Collection::CommunityPosts, &kept_post.id).await);
    assert!(h.exists(Collection::Interactions, &kept_like.id).await);
    assert_eq!(h.blobs.all_keys(), vec!["videos/1.mp4".to_string()]);
}

#[tokio::test]
async fn shared_blob_is_deleted_once() {
    let h = TestHarness::new();
    let course = h.course("course_1", &[]).await;
    let assignment = h.assignment(&course.id).await;
    h.submission(&assignment, "user_a", Some("videos/shared.mp4")).await;
    h.submission(&assignment, "user_b", Some("videos/shared.mp4")).await;

    let report = h.engine.delete_course("course_1").await.unwrap();

    assert_eq!(report.submissions, 2);
    assert_eq!(report.videos_deleted, 1);
    assert_eq!(h.blobs.all_keys(), vec!["videos/shared.mp4".to_string()]);
}

#[tokio::test]
async fn leaves_then_parents_then_root() {
    let h = TestHarness::new();
    let course = h.course("course_1", &[]).await;
    let assignment = h.assignment(&course.id).await;
    let submission = h.submission(&assignment, "user_a", None).await;
    h.peer_response("user_b", &submission).await;
    let post = h.post(&course.id, "user_a").await;
    h.comment(&post, "user_b").await;

    h.engine.delete_course("course_1").await.unwrap();

    let last_leaf = [
        Collection::Submissions,
        Collection::PeerResponses,
        Collection::CommunityComments,
    ]
    .into_iter()
    .filter_map(|c| h.records.last_delete_of(c))
    .max()
    .unwrap();
    let first_parent = [Collection::Assignments, Collection::CommunityPosts]
        .into_iter()
        .filter_map(|c| h.records.first_delete_of(c))
        .min()
        .unwrap();
    let root = h.records.first_delete_of(Collection::Courses).unwrap();

    assert!(last_leaf < first_parent);
    assert_eq!(root, h.records.deletes().len() - 1);
}

#[tokio::test]
async fn failed_record_delete_is_reported_and_others_continue() {
    let h = TestHarness::new();
    let course = h.course("course_1", &[]).await;
    let assignment = h.assignment(&course.id).await;
    let stuck = h.submission(&assignment, "user_a", None).await;
    let fine = h.submission(&assignment, "user_b", None).await;
    h.records.fail_delete(stuck.id.as_str());

    let report = h.engine.delete_course("course_1").await.unwrap();

    assert!(report.success);
    assert_eq!(report.status, CascadeStatus::CompletedWithWarnings);
    assert_eq!(report.submissions, 1);
    assert_eq!(report.assignments, 0);
    assert!(report.course_deleted);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].starts_with(&format!("submission {}", stuck.id)));
    assert!(report.errors[1].starts_with(&format!("assignment {} kept", assignment.id)));
    assert!(!h.exists(Collection::Submissions, &fine.id).await);
    assert!(h.exists(Collection::Assignments, &assignment.id).await);
}

#[tokio::test]
async fn rerun_finishes_what_a_failed_run_left_behind() {
    let h = TestHarness::new();
    let course = h.course("course_1", &[]).await;
    let assignment = h.assignment(&course.id).await;
    let stuck = h.submission(&assignment, "user_a", Some("videos/a.mp4")).await;
    let review = h.peer_response("user_b", &stuck).await;
    let post = h.post(&course.id, "user_b").await;
    let reply = h.comment(&post, "user_a").await;
    h.records.fail_delete(stuck.id.as_str());
    h.records.fail_delete(reply.id.as_str());

    let first = h.engine.delete_course("course_1").await.unwrap();
    assert!(first.course_deleted);
    assert!(h.exists(Collection::Assignments, &assignment.id).await);
    assert!(h.exists(Collection::CommunityPosts, &post.id).await);
    assert!(!h.exists(Collection::PeerResponses, &review.id).await);

    h.records.clear_failing_deletes();
    let second = h.engine.delete_course("course_1").await.unwrap();

    assert!(!second.course_deleted);
    assert_eq!(second.submissions, 1);
    assert_eq!(second.assignments, 1);
    assert_eq!(second.errors.len(), 1);
    assert!(second.errors[0].contains("not found"));
    for (collection, id) in [
        (Collection::Submissions, stuck.id.to_string()),
        (Collection::Assignments, assignment.id.to_string()),
        (Collection::CommunityComments, reply.id.to_string()),
        (Collection::CommunityPosts, post.id.to_string()),
    ] {
        assert!(!h.exists(collection, &id).await, "{collection} {id} survived");
    }
}

#[tokio::test]
async fn submission_without_assignment_is_still_deleted() {
    let h = TestHarness::new();
    let course = h.course("course_1", &[]).await;
    let mut orphan =
        Submission::new("asg_deleted".parse().unwrap(), course.id.clone(), uid("user_a"));
    orphan.video_key = Some("videos/orphan.mp4".into());
    h.records.put_submission(&orphan).await.unwrap();

    let report = h.engine.delete_course("course_1").await.unwrap();

    assert_eq!(report.status, CascadeStatus::Completed);
    assert_eq!(report.submissions, 1);
    assert_eq!(report.videos_deleted, 1);
    assert_eq!(h.blobs.all_keys(), vec!["videos/orphan.mp4".to_string()]);
    assert!(!h.exists(Collection::Submissions, &orphan.id).await);
}

#[tokio::test]
async fn blob_transport_failure_does_not_stop_record_deletion() {
    let blobs = RecordingBlobStore::new();
    blobs.fail_next_batches(1);
    let h = TestHarness::with_blobs(blobs);
    let course = h.course("course_1", &[]).await;
    let assignment = h.assignment(&course.id).await;
    for (student, key) in [("user_a", "videos/a.mp4"), ("user_b", "videos/b.mp4")] {
        h.submission(&assignment, student, Some(key)).await;
    }

    let report = h.engine.delete_course("course_1").await.unwrap();

    assert!(report.success);
    assert_eq!(report.videos_deleted, 0);
    assert_eq!(report.videos_failed, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("2 keys"));
    assert_eq!(report.submissions, 2);
    assert!(report.course_deleted);
}

#[tokio::test]
async fn blank_course_id_touches_nothing() {
    let h = TestHarness::new();
    h.course("course_1", &[]).await;

    let err = h.engine.delete_course("").await.unwrap_err();

    assert!(err.is_precondition());
    assert!(h.records.deletes().is_empty());
    assert!(h.blobs.batches().is_empty());
}
