//! Core types for the classroom platform.
//!
//! This crate provides the foundational types shared by the record store, the
//! blob store and the cascade engine:
//!
//! - **Identifiers**: `CourseId`, `UserId`, `AssignmentId`, `SubmissionId`, ...
//! - **Records**: `Course`, `Assignment`, `Submission`, `PeerResponse`,
//!   `CommunityPost`, `CommunityComment`, `Interaction`
//! - **Collections**: `Collection`, the record-store collection tag
//! - **Locators**: resolving a stored media locator into a blob key
//! - **Reports**: `CourseDeletionReport`, `StudentRemovalReport`, `CascadePlan`
//!
//! # Blob keys
//!
//! Submissions reference media objects (videos, thumbnails) by locator. New
//! submissions carry the blob key directly; older ones only carry a display
//! URL, which [`locator::blob_key_from_locator`] turns back into a key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collection;
pub mod ids;
pub mod locator;
pub mod records;
pub mod report;

pub use collection::Collection;
pub use ids::{
    AssignmentId, CommentId, CourseId, IdError, InteractionId, PeerResponseId, PostId,
    SubmissionId, UserId,
};
pub use locator::{blob_key_from_locator, resolve_media_key};
pub use records::{
    Assignment, AssignmentStatus, CommunityComment, CommunityPost, Course, Interaction,
    InteractionKind, PeerResponse, RosterEntry, Submission,
};
pub use report::{
    CascadePlan, CascadeRoot, CascadeStatus, CourseDeletionReport, StudentRemovalReport,
};
