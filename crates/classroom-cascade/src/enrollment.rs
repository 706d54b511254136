//! Roster mutation for student removal.

use classroom_core::{CourseId, RosterEntry, UserId};
use classroom_store::{RecordStore, RosterWrite};
use tracing::{debug, info, warn};

/// Result of removing a student from a roster.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RosterUpdate {
    /// Roster length afterwards, when the course was read and written.
    pub roster_size: Option<usize>,
    /// Whether the student was on the roster.
    pub removed: bool,
    /// What went wrong, if anything.
    pub errors: Vec<String>,
}

/// The roster without `student_id`, other entries untouched and in order.
#[must_use]
pub fn without_student(roster: &[RosterEntry], student_id: &UserId) -> Vec<RosterEntry> {
    roster
        .iter()
        .filter(|entry| entry.student_id != *student_id)
        .cloned()
        .collect()
}

/// Removes a student from a course roster with a conditional write.
pub struct EnrollmentMutator<'a> {
    records: &'a dyn RecordStore,
    max_attempts: u32,
}

impl<'a> EnrollmentMutator<'a> {
    /// Create a mutator that retries a conflicting write up to
    /// `max_attempts` times in total.
    #[must_use]
    pub fn new(records: &'a dyn RecordStore, max_attempts: u32) -> Self {
        Self {
            records,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Remove the student if present.
    ///
    /// Each attempt reads the course, filters the roster and writes it back
    /// only if the roster version is unchanged. A missing course is reported,
    /// not raised.
    pub async fn remove_student(&self, course_id: &CourseId, student_id: &UserId) -> RosterUpdate {
        let mut update = RosterUpdate::default();

        for attempt in 1..=self.max_attempts {
            let course = match self.records.get_course(course_id).await {
                Ok(Some(course)) => course,
                Ok(None) => {
                    update.errors.push(format!("course {course_id} not found"));
                    return update;
                }
                Err(e) => {
                    warn!(course_id = %course_id, error = %e, "Failed to read course");
                    update
                        .errors
                        .push(format!("course {course_id}: failed to read roster: {e}"));
                    return update;
                }
            };

            let roster = without_student(&course.roster, student_id);
            if roster.len() == course.roster.len() {
                debug!(course_id = %course_id, student_id = %student_id, "Student not on roster");
                update.roster_size = Some(roster.len());
                return update;
            }

            match self
                .records
                .update_roster(course_id, course.roster_version, roster)
                .await
            {
                Ok(RosterWrite::Applied { student_count, .. }) => {
                    info!(
                        course_id = %course_id,
                        student_id = %student_id,
                        roster_size = student_count,
                        "Student removed from roster"
                    );
                    update.removed = true;
                    update.roster_size = Some(student_count);
                    return update;
                }
                Ok(RosterWrite::Conflict { current_version }) => {
                    debug!(
                        course_id = %course_id,
                        attempt,
                        expected = course.roster_version,
                        current_version,
                        "Roster changed concurrently, retrying"
                    );
                }
                Ok(RosterWrite::Missing) => {
                    update.errors.push(format!("course {course_id} not found"));
                    return update;
                }
                Err(e) => {
                    warn!(course_id = %course_id, error = %e, "Roster write failed");
                    update
                        .errors
                        .push(format!("course {course_id}: failed to update roster: {e}"));
                    return update;
                }
            }
        }

        warn!(course_id = %course_id, attempts = self.max_attempts, "Roster update gave up");
        update.errors.push(format!(
            "course {course_id}: roster update gave up after {} conflicting writes",
            self.max_attempts
        ));
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use classroom_core::Course;
    use classroom_store::MemoryRecordStore;

    fn entry(id: &str) -> RosterEntry {
        RosterEntry {
            student_id: id.parse().unwrap(),
            enrolled_at: Utc::now(),
        }
    }

    fn ids(roster: &[RosterEntry]) -> Vec<&str> {
        roster.iter().map(|e| e.student_id.as_str()).collect()
    }

    #[test]
    fn removal_preserves_order() {
        let roster = vec![entry("a"), entry("b"), entry("s"), entry("c")];
        let filtered = without_student(&roster, &"s".parse().unwrap());
        assert_eq!(ids(&filtered), vec!["a", "b", "c"]);
        assert_eq!(filtered[0], roster[0]);
    }

    #[tokio::test]
    async fn student_is_removed_and_count_updated() {
        let store = MemoryRecordStore::new();
        let course_id: CourseId = "course_1".parse().unwrap();
        let mut course = Course::new(course_id.clone(), "Intro", "CS-1", "user_t".parse().unwrap());
        for s in ["a", "b", "s", "c"] {
            course.enroll(s.parse().unwrap());
        }
        store.put_course(&course).await.unwrap();

        let update = EnrollmentMutator::new(&store, 3)
            .remove_student(&course_id, &"s".parse().unwrap())
            .await;

        assert!(update.removed);
        assert_eq!(update.roster_size, Some(3));
        assert!(update.errors.is_empty());

        let stored = store.get_course(&course_id).await.unwrap().unwrap();
        assert_eq!(ids(&stored.roster), vec!["a", "b", "c"]);
        assert_eq!(stored.student_count, 3);
    }

    #[tokio::test]
    async fn missing_course_is_reported() {
        let store = MemoryRecordStore::new();
        let update = EnrollmentMutator::new(&store, 3)
            .remove_student(&"course_x".parse().unwrap(), &"s".parse().unwrap())
            .await;

        assert!(!update.removed);
        assert_eq!(update.roster_size, None);
        assert_eq!(update.errors, vec!["course course_x not found".to_string()]);
    }
}
