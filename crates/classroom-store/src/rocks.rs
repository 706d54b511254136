//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksRecordStore` implementation of the
//! `RecordStore` trait. `RocksDB` calls are blocking, so every trait method
//! runs its work on Tokio's blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use classroom_core::{
    Assignment, AssignmentId, Collection, CommunityComment, CommunityPost, Course, CourseId,
    Interaction, PeerResponse, PostId, RosterEntry, Submission, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf, primary_cf};
use crate::{RecordStore, RosterWrite};

/// A record type with a primary column family and secondary index entries.
trait IndexedRecord: Serialize + DeserializeOwned + Send + 'static {
    /// Primary column family.
    const CF: &'static str;

    fn record_id(&self) -> &str;

    /// `(column family, key)` pairs of every index entry for this record.
    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)>;
}

impl IndexedRecord for Course {
    const CF: &'static str = cf::COURSES;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        Vec::new()
    }
}

impl IndexedRecord for Assignment {
    const CF: &'static str = cf::ASSIGNMENTS;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        vec![(
            cf::ASSIGNMENTS_BY_COURSE,
            keys::index_key(&[self.course_id.as_str()], self.id.as_str()),
        )]
    }
}

impl IndexedRecord for Submission {
    const CF: &'static str = cf::SUBMISSIONS;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        vec![
            (
                cf::SUBMISSIONS_BY_ASSIGNMENT,
                keys::index_key(&[self.assignment_id.as_str()], self.id.as_str()),
            ),
            (
                cf::SUBMISSIONS_BY_COURSE,
                keys::index_key(&[self.course_id.as_str()], self.id.as_str()),
            ),
            (
                cf::SUBMISSIONS_BY_STUDENT,
                keys::index_key(
                    &[self.student_id.as_str(), self.course_id.as_str()],
                    self.id.as_str(),
                ),
            ),
        ]
    }
}

impl IndexedRecord for PeerResponse {
    const CF: &'static str = cf::PEER_RESPONSES;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        vec![
            (
                cf::PEER_RESPONSES_BY_ASSIGNMENT,
                keys::index_key(&[self.assignment_id.as_str()], self.id.as_str()),
            ),
            (
                cf::PEER_RESPONSES_BY_REVIEWER,
                keys::index_key(&[self.reviewer_id.as_str()], self.id.as_str()),
            ),
        ]
    }
}

impl IndexedRecord for CommunityPost {
    const CF: &'static str = cf::POSTS;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        vec![(
            cf::POSTS_BY_COURSE,
            keys::index_key(&[self.course_id.as_str()], self.id.as_str()),
        )]
    }
}

impl IndexedRecord for CommunityComment {
    const CF: &'static str = cf::COMMENTS;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        vec![
            (
                cf::COMMENTS_BY_POST,
                keys::index_key(&[self.post_id.as_str()], self.id.as_str()),
            ),
            (
                cf::COMMENTS_BY_AUTHOR,
                keys::index_key(&[self.author_id.as_str()], self.id.as_str()),
            ),
        ]
    }
}

impl IndexedRecord for Interaction {
    const CF: &'static str = cf::INTERACTIONS;

    fn record_id(&self) -> &str {
        self.id.as_str()
    }

    fn index_entries(&self) -> Vec<(&'static str, Vec<u8>)> {
        vec![
            (
                cf::INTERACTIONS_BY_USER,
                keys::index_key(&[self.user_id.as_str()], self.id.as_str()),
            ),
            (
                cf::INTERACTIONS_BY_TARGET,
                keys::index_key(&[self.target_id.as_str()], self.id.as_str()),
            ),
        ]
    }
}

struct Inner {
    db: DBWithThreadMode<MultiThreaded>,
    /// Serializes every write to the courses column family so the roster
    /// compare-and-swap cannot interleave with another course write.
    course_lock: Mutex<()>,
}

impl Inner {
    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock_courses(&self) -> Result<MutexGuard<'_, ()>> {
        self.course_lock
            .lock()
            .map_err(|_| StoreError::Database("course lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get<T: IndexedRecord>(&self, id: &str) -> Result<Option<T>> {
        let cf = self.cf(T::CF)?;
        self.db
            .get_cf(&cf, keys::record_key(id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Write a record and its index entries, dropping index entries of the
    /// version it replaces.
    fn put<T: IndexedRecord>(&self, record: &T) -> Result<()> {
        let mut batch = WriteBatch::default();

        if let Some(old) = self.get::<T>(record.record_id())? {
            for (name, key) in old.index_entries() {
                batch.delete_cf(&self.cf(name)?, key);
            }
        }

        let primary = self.cf(T::CF)?;
        batch.put_cf(
            &primary,
            keys::record_key(record.record_id()),
            Self::serialize(record)?,
        );
        for (name, key) in record.index_entries() {
            batch.put_cf(&self.cf(name)?, key, []); // Index entry (empty value)
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Delete a record and its index entries. Returns `false` if absent.
    fn remove<T: IndexedRecord>(&self, id: &str) -> Result<bool> {
        let Some(old) = self.get::<T>(id)? else {
            return Ok(false);
        };

        let mut batch = WriteBatch::default();
        batch.delete_cf(&self.cf(T::CF)?, keys::record_key(id));
        for (name, key) in old.index_entries() {
            batch.delete_cf(&self.cf(name)?, key);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(true)
    }

    /// List the records indexed under an exact owner.
    fn list<T: IndexedRecord>(&self, index: &'static str, owner: &[&str]) -> Result<Vec<T>> {
        let cf_index = self.cf(index)?;
        let prefix = keys::owner_prefix(owner);

        let mut ids = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf_index, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let id = keys::id_from_index_key(&key, &prefix).ok_or(StoreError::CorruptKey {
                column_family: index,
            })?;
            ids.push(id);
        }

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            // A record deleted between the index scan and the read is skipped.
            if let Some(record) = self.get::<T>(&id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn update_roster(
        &self,
        course_id: &CourseId,
        expected_version: u64,
        roster: Vec<RosterEntry>,
    ) -> Result<RosterWrite> {
        let _guard = self.lock_courses()?;

        let Some(mut course) = self.get::<Course>(course_id.as_str())? else {
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
        self.put(&course)?;

        Ok(RosterWrite::Applied {
            version: course.roster_version,
            student_count: course.student_count,
        })
    }

    fn remove_in(&self, collection: Collection, id: &str) -> Result<bool> {
        match collection {
            Collection::Courses => {
                let _guard = self.lock_courses()?;
                self.remove::<Course>(id)
            }
            Collection::Assignments => self.remove::<Assignment>(id),
            Collection::Submissions => self.remove::<Submission>(id),
            Collection::PeerResponses => self.remove::<PeerResponse>(id),
            Collection::CommunityPosts => self.remove::<CommunityPost>(id),
            Collection::CommunityComments => self.remove::<CommunityComment>(id),
            Collection::Interactions => self.remove::<Interaction>(id),
        }
    }
}

/// RocksDB-backed record store.
#[derive(Clone)]
pub struct RocksRecordStore {
    inner: Arc<Inner>,
}

impl RocksRecordStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                db,
                course_lock: Mutex::new(()),
            }),
        })
    }

    /// Run a blocking closure against the database on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Inner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| StoreError::Database(format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl RecordStore for RocksRecordStore {
    async fn put_course(&self, course: &Course) -> Result<()> {
        let mut course = course.clone();
        self.blocking(move |db| {
            let _guard = db.lock_courses()?;
            if let Some(stored) = db.get::<Course>(course.id.as_str())? {
                course.keep_newer_roster(&stored);
            }
            db.put(&course)
        })
        .await
    }

    async fn get_course(&self, course_id: &CourseId) -> Result<Option<Course>> {
        let id = course_id.to_string();
        self.blocking(move |db| db.get::<Course>(&id)).await
    }

    async fn update_roster(
        &self,
        course_id: &CourseId,
        expected_version: u64,
        roster: Vec<RosterEntry>,
    ) -> Result<RosterWrite> {
        let course_id = course_id.clone();
        self.blocking(move |db| db.update_roster(&course_id, expected_version, roster))
            .await
    }

    async fn put_assignment(&self, assignment: &Assignment) -> Result<()> {
        let assignment = assignment.clone();
        self.blocking(move |db| db.put(&assignment)).await
    }

    async fn list_assignments_by_course(&self, course_id: &CourseId) -> Result<Vec<Assignment>> {
        let course_id = course_id.to_string();
        self.blocking(move |db| db.list(cf::ASSIGNMENTS_BY_COURSE, &[course_id.as_str()]))
            .await
    }

    async fn put_submission(&self, submission: &Submission) -> Result<()> {
        let submission = submission.clone();
        self.blocking(move |db| db.put(&submission)).await
    }

    async fn list_submissions_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<Submission>> {
        let assignment_id = assignment_id.to_string();
        self.blocking(move |db| db.list(cf::SUBMISSIONS_BY_ASSIGNMENT, &[assignment_id.as_str()]))
            .await
    }

    async fn list_submissions_by_course(&self, course_id: &CourseId) -> Result<Vec<Submission>> {
        let course_id = course_id.to_string();
        self.blocking(move |db| db.list(cf::SUBMISSIONS_BY_COURSE, &[course_id.as_str()]))
            .await
    }

    async fn list_submissions_by_student(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Submission>> {
        let student_id = student_id.to_string();
        let course_id = course_id.to_string();
        self.blocking(move |db| db.list(cf::SUBMISSIONS_BY_STUDENT, &[student_id.as_str(), course_id.as_str()]))
            .await
    }

    async fn put_peer_response(&self, response: &PeerResponse) -> Result<()> {
        let response = response.clone();
        self.blocking(move |db| db.put(&response)).await
    }

    async fn list_peer_responses_by_assignment(
        &self,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<PeerResponse>> {
        let assignment_id = assignment_id.to_string();
        self.blocking(move |db| db.list(cf::PEER_RESPONSES_BY_ASSIGNMENT, &[assignment_id.as_str()]))
            .await
    }

    async fn list_peer_responses_by_reviewer(
        &self,
        reviewer_id: &UserId,
    ) -> Result<Vec<PeerResponse>> {
        let reviewer_id = reviewer_id.to_string();
        self.blocking(move |db| db.list(cf::PEER_RESPONSES_BY_REVIEWER, &[reviewer_id.as_str()]))
            .await
    }

    async fn put_post(&self, post: &CommunityPost) -> Result<()> {
        let post = post.clone();
        self.blocking(move |db| db.put(&post)).await
    }

    async fn list_posts_by_course(&self, course_id: &CourseId) -> Result<Vec<CommunityPost>> {
        let course_id = course_id.to_string();
        self.blocking(move |db| db.list(cf::POSTS_BY_COURSE, &[course_id.as_str()]))
            .await
    }

    async fn put_comment(&self, comment: &CommunityComment) -> Result<()> {
        let comment = comment.clone();
        self.blocking(move |db| db.put(&comment)).await
    }

    async fn list_comments_by_post(&self, post_id: &PostId) -> Result<Vec<CommunityComment>> {
        let post_id = post_id.to_string();
        self.blocking(move |db| db.list(cf::COMMENTS_BY_POST, &[post_id.as_str()]))
            .await
    }

    async fn list_comments_by_author(
        &self,
        author_id: &UserId,
    ) -> Result<Vec<CommunityComment>> {
        let author_id = author_id.to_string();
        self.blocking(move |db| db.list(cf::COMMENTS_BY_AUTHOR, &[author_id.as_str()]))
            .await
    }

    async fn put_interaction(&self, interaction: &Interaction) -> Result<()> {
        let interaction = interaction.clone();
        self.blocking(move |db| db.put(&interaction)).await
    }

    async fn list_interactions_by_user(&self, user_id: &UserId) -> Result<Vec<Interaction>> {
        let user_id = user_id.to_string();
        self.blocking(move |db| db.list(cf::INTERACTIONS_BY_USER, &[user_id.as_str()]))
            .await
    }

    async fn list_interactions_by_target(&self, target_id: &str) -> Result<Vec<Interaction>> {
        let target_id = target_id.to_string();
        self.blocking(move |db| db.list(cf::INTERACTIONS_BY_TARGET, &[target_id.as_str()]))
            .await
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.blocking(move |db| {
            let cf = db.cf(primary_cf(collection))?;
            let found = db
                .db
                .get_pinned_cf(&cf, keys::record_key(&id))
                .map_err(|e| StoreError::Database(e.to_string()))?
                .is_some();
            Ok(found)
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.blocking(move |db| db.remove_in(collection, &id)).await
    }
}
