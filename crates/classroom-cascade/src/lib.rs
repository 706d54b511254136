//! Cascading deletion for the classroom platform.
//!
//! Deleting a course, or removing one student from it, touches two stores
//! that share no transaction: the record store and the blob store holding
//! submission media. [`CascadeEngine`] runs the deletion as ordered phases
//! and always returns a report of what it did:
//!
//! 1. **Resolve**: find every dependent record ([`resolver`])
//! 2. **Blobs**: delete the media those records reference, in bounded
//!    batches ([`blobs`])
//! 3. **Records**: delete dependent records, leaves before parents
//!    ([`records`])
//! 4. **Root**: delete the course, or take the student off its roster
//!    ([`enrollment`])
//!
//! Failures inside a phase become lines in the report's `errors` and never
//! stop later phases. The only error a caller sees is a bad root identifier.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use classroom_blob::MemoryBlobStore;
//! use classroom_cascade::{CascadeConfig, CascadeEngine};
//! use classroom_store::MemoryRecordStore;
//!
//! # async fn example() -> Result<(), classroom_cascade::CascadeError> {
//! let engine = CascadeEngine::new(
//!     Arc::new(MemoryRecordStore::new()),
//!     Arc::new(MemoryBlobStore::new("classroom-media")),
//!     CascadeConfig::default(),
//! )?;
//!
//! let report = engine.delete_course("course_1").await?;
//! for line in &report.errors {
//!     eprintln!("warning: {line}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod blobs;
pub mod config;
pub mod engine;
pub mod enrollment;
pub mod error;
pub mod ledger;
pub mod records;
pub mod resolver;

pub use blobs::{BatchBlobDeleter, BlobPhase, BlobTally};
pub use config::CascadeConfig;
pub use engine::CascadeEngine;
pub use enrollment::{EnrollmentMutator, RosterUpdate};
pub use error::{CascadeError, Result};
pub use ledger::Ledger;
pub use records::{CollectionOutcome, RecordDeleter, RecordPhase};
pub use resolver::{Dependents, Resolver};
