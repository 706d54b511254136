//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{courses, health};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Cascades (Service API Key auth)
/// - `DELETE /v1/courses/:course_id` - Delete a course
/// - `DELETE /v1/courses/:course_id/students/:student_id` - Remove a student
/// - `GET /v1/courses/:course_id/deletion-preview` - Dry-run course deletion
/// - `GET /v1/courses/:course_id/students/:student_id/deletion-preview` -
///   Dry-run student removal
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Cascades
        .route("/v1/courses/:course_id", delete(courses::delete_course))
        .route(
            "/v1/courses/:course_id/students/:student_id",
            delete(courses::remove_student),
        )
        .route(
            "/v1/courses/:course_id/deletion-preview",
            get(courses::preview_course_deletion),
        )
        .route(
            "/v1/courses/:course_id/students/:student_id/deletion-preview",
            get(courses::preview_student_removal),
        )
        // Middleware
        // Router::layer wraps outside-in, so the last layer added runs first:
        // trace, then CORS, then body limit, then timeout.
        .layer(TimeoutLayer::new(request_timeout))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}
