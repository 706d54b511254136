//! Blob store error types.

/// Result type for blob store operations.
pub type Result<T> = std::result::Result<T, BlobError>;

/// Errors that fail a whole blob store request.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned an error response.
    #[error("blob gateway error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch exceeds the store's per-request ceiling.
    #[error("batch of {size} keys exceeds maximum of {max}")]
    BatchTooLarge {
        /// Keys in the rejected batch.
        size: usize,
        /// Maximum keys per request.
        max: usize,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
