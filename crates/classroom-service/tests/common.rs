//! Common test utilities for classroom service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;

use classroom_blob::{BlobStore, BulkDeleteOutcome, MemoryBlobStore};
use classroom_cascade::{CascadeConfig, CascadeEngine};
use classroom_core::{Assignment, Course, CourseId, Submission, UserId};
use classroom_service::{create_router, AppState, BlobBackend, ServiceConfig};
use classroom_store::{MemoryRecordStore, RecordStore};

pub const BUCKET: &str = "classroom-media";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Record store behind the engine, for seeding and inspection.
    pub records: Arc<MemoryRecordStore>,
    /// Blob store behind the engine.
    pub blobs: Arc<MemoryBlobStore>,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with empty in-memory stores.
    pub fn new() -> Self {
        let blobs = Arc::new(MemoryBlobStore::new(BUCKET));
        Self::build(blobs.clone(), blobs, ServiceConfig::default().request_timeout_seconds)
    }

    /// Create a harness whose blob deletes take `delay` to answer and whose
    /// requests time out after `request_timeout_seconds`.
    pub fn with_slow_blobs(delay: Duration, request_timeout_seconds: u64) -> Self {
        let blobs = Arc::new(MemoryBlobStore::new(BUCKET));
        let slow = Arc::new(SlowBlobStore {
            inner: blobs.clone(),
            delay,
        });
        Self::build(blobs, slow, request_timeout_seconds)
    }

    fn build(
        blobs: Arc<MemoryBlobStore>,
        engine_blobs: Arc<dyn BlobStore>,
        request_timeout_seconds: u64,
    ) -> Self {
        let records = Arc::new(MemoryRecordStore::new());
        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            service_api_key: Some(service_api_key.clone()),
            blob_backend: BlobBackend::Memory,
            request_timeout_seconds,
            cascade: CascadeConfig::for_bucket(BUCKET),
            ..ServiceConfig::default()
        };

        let engine = CascadeEngine::new(records.clone(), engine_blobs, config.cascade.clone())
            .expect("valid cascade config");
        let state = AppState::new(Arc::new(engine), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            records,
            blobs,
            service_api_key,
        }
    }

    /// Seed a course with the given students enrolled.
    pub async fn course(&self, id: &str, students: &[&str]) -> Course {
        let mut course = Course::new(id.parse().unwrap(), "Course", "C-1", uid("user_teacher"));
        for s in students {
            course.enroll(uid(s));
        }
        self.records.put_course(&course).await.unwrap();
        course
    }

    /// Seed an assignment plus one submission with a stored video.
    pub async fn submission(&self, course: &CourseId, student: &str, key: &str) -> Submission {
        let assignment = Assignment::new(course.clone(), "Assignment");
        self.records.put_assignment(&assignment).await.unwrap();

        let mut submission =
            Submission::new(assignment.id.clone(), course.clone(), uid(student));
        submission.video_key = Some(key.to_string());
        self.records.put_submission(&submission).await.unwrap();
        self.blobs.put(key).await;
        submission
    }
}

/// Memory blob store that sleeps before every bulk delete.
pub struct SlowBlobStore {
    inner: Arc<MemoryBlobStore>,
    delay: Duration,
}

#[async_trait]
impl BlobStore for SlowBlobStore {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size()
    }

    async fn delete_objects(&self, keys: &[String]) -> classroom_blob::Result<BulkDeleteOutcome> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete_objects(keys).await
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
