//! Identifier types for the classroom platform.
//!
//! Record identifiers are opaque strings assigned by whichever part of the
//! platform created the record (`course_001`, a UUID, an LMS export key, ...).
//! The only rules are that an identifier is not blank, contains no NUL byte
//! (the store uses NUL as its composite-key separator) and fits in
//! [`MAX_ID_LEN`] bytes.
//!
//! # Macro-based ID Types
//!
//! The `string_id_type!` macro keeps every identifier type on the same
//! validation, serialization, parsing and display implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum identifier length in bytes.
pub const MAX_ID_LEN: usize = 256;

/// Validate a raw identifier.
fn validate(value: &str) -> Result<(), IdError> {
    if value.trim().is_empty() {
        return Err(IdError::Empty);
    }
    if value.contains('\0') {
        return Err(IdError::ContainsNul);
    }
    if value.len() > MAX_ID_LEN {
        return Err(IdError::TooLong { max: MAX_ID_LEN });
    }
    Ok(())
}

/// Macro to define a string identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `String` with implementations for:
/// - `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (validated on the way in)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
/// - `AsRef<str>`
///
/// # Example
///
/// ```ignore
/// string_id_type!(MyId, "my", "A custom identifier type.");
/// let id = MyId::generate();
/// let parsed: MyId = id.to_string().parse().unwrap();
/// ```
macro_rules! string_id_type {
    ($name:ident, $prefix:literal, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create an identifier, validating it.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is blank, contains a NUL byte or
            /// is longer than [`MAX_ID_LEN`].
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                validate(&value)?;
                Ok(Self(value))
            }

            /// Generate a new random identifier (primarily for testing).
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, uuid::Uuid::new_v4().simple()))
            }

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_type!(CourseId, "course", "A course identifier.");
string_id_type!(
    UserId,
    "user",
    "A user identifier.\n\nStudents, instructors, reviewers and post authors share one identity space."
);
string_id_type!(AssignmentId, "asg", "An assignment identifier.");
string_id_type!(SubmissionId, "sub", "A submission identifier.");
string_id_type!(PeerResponseId, "peer", "A peer response identifier.");
string_id_type!(PostId, "post", "A community post identifier.");
string_id_type!(CommentId, "cmt", "A community comment identifier.");
string_id_type!(InteractionId, "ixn", "An interaction identifier.");

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is empty or whitespace only.
    #[error("identifier is empty")]
    Empty,

    /// The input contains a NUL byte.
    #[error("identifier contains a NUL byte")]
    ContainsNul,

    /// The input is longer than allowed.
    #[error("identifier longer than {max} bytes")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_id_accepts_plain_strings() {
        let id = CourseId::new("course_001").unwrap();
        assert_eq!(id.as_str(), "course_001");
        assert_eq!(id.to_string(), "course_001");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(CourseId::new(""), Err(IdError::Empty));
        assert_eq!(UserId::new("   "), Err(IdError::Empty));
    }

    #[test]
    fn nul_bytes_are_rejected() {
        assert_eq!(SubmissionId::new("a\0b"), Err(IdError::ContainsNul));
    }

    #[test]
    fn long_ids_are_rejected() {
        let long = "x".repeat(MAX_ID_LEN + 1);
        assert_eq!(
            AssignmentId::new(long),
            Err(IdError::TooLong { max: MAX_ID_LEN })
        );
    }

    #[test]
    fn generated_ids_carry_prefix() {
        assert!(CourseId::generate().as_str().starts_with("course_"));
        assert!(PostId::generate().as_str().starts_with("post_"));
        assert_ne!(UserId::generate(), UserId::generate());
    }

    #[test]
    fn deserialization_validates() {
        let ok: CourseId = serde_json::from_str("\"course_7\"").unwrap();
        assert_eq!(ok.as_str(), "course_7");
        assert!(serde_json::from_str::<CourseId>("\"\"").is_err());
    }
}
