//! Classroom cascade HTTP API service.
//!
//! A thin HTTP surface over [`classroom_cascade::CascadeEngine`]:
//!
//! - Course deletion
//! - Student removal
//! - Dry-run previews of both
//!
//! # Authentication
//!
//! Every cascade endpoint requires the service API key in `x-api-key`.
//! Callers are other platform services, never end users.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Axum handlers must be async

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{BlobBackend, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{build_blob_store, AppState};
