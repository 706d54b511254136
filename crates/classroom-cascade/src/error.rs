//! Cascade error types.
//!
//! Only problems that stop a cascade before it touches anything are errors.
//! Failures during a run end up as text in the returned report.

use classroom_core::IdError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, CascadeError>;

/// Errors that prevent a cascade from starting.
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    /// A root identifier is missing or malformed.
    #[error("invalid {field}: {source}")]
    InvalidIdentifier {
        /// Which identifier (`course_id`, `student_id`).
        field: &'static str,
        /// Why it was rejected.
        #[source]
        source: IdError,
    },

    /// The engine was configured with unusable limits.
    #[error("invalid cascade configuration: {0}")]
    Configuration(String),
}

impl CascadeError {
    /// Whether the caller supplied a bad root identifier.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidIdentifier { .. })
    }
}
