//! Course deletion and student removal handlers.
//!
//! A cascade that starts always answers `200` with its report, even when the
//! report lists failures. Only a bad identifier is an error response.
//!
//! Cascades run on their own task. A request that times out or disconnects
//! stops waiting for the report but the cascade still runs to the end.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use classroom_core::{CascadePlan, CourseDeletionReport, StudentRemovalReport};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Delete a course and everything that depends on it.
///
/// `DELETE /v1/courses/:course_id`
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDeletionReport>, ApiError> {
    tracing::info!(
        service = %auth.service_name,
        course_id = %course_id,
        "Course deletion requested"
    );

    let engine = Arc::clone(&state.engine);
    let report = detached(async move { engine.delete_course(&course_id).await }).await?;

    if !report.errors.is_empty() {
        tracing::warn!(
            course_id = %report.course_id,
            errors = report.errors.len(),
            "Course deletion completed with warnings"
        );
    }

    Ok(Json(report))
}

/// Remove a student from a course along with their work in it.
///
/// `DELETE /v1/courses/:course_id/students/:student_id`
pub async fn remove_student(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Path((course_id, student_id)): Path<(String, String)>,
) -> Result<Json<StudentRemovalReport>, ApiError> {
    tracing::info!(
        service = %auth.service_name,
        course_id = %course_id,
        student_id = %student_id,
        "Student removal requested"
    );

    let engine = Arc::clone(&state.engine);
    let report =
        detached(async move { engine.remove_student(&course_id, &student_id).await }).await?;

    if !report.errors.is_empty() {
        tracing::warn!(
            course_id = %report.course_id,
            student_id = %report.student_id,
            errors = report.errors.len(),
            "Student removal completed with warnings"
        );
    }

    Ok(Json(report))
}

/// Show what deleting a course would remove.
///
/// `GET /v1/courses/:course_id/deletion-preview`
pub async fn preview_course_deletion(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(course_id): Path<String>,
) -> Result<Json<CascadePlan>, ApiError> {
    let plan = state.engine.preview_course(&course_id).await?;
    Ok(Json(plan))
}

/// Show what removing a student would remove.
///
/// `GET /v1/courses/:course_id/students/:student_id/deletion-preview`
pub async fn preview_student_removal(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path((course_id, student_id)): Path<(String, String)>,
) -> Result<Json<CascadePlan>, ApiError> {
    let plan = state.engine.preview_student(&course_id, &student_id).await?;
    Ok(Json(plan))
}

/// Run a cascade to completion even if the caller goes away.
async fn detached<T, F>(cascade: F) -> Result<T, ApiError>
where
    F: Future<Output = classroom_cascade::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(cascade)
        .await
        .map_err(|e| ApiError::Internal(format!("cascade task failed: {e}")))?
        .map_err(ApiError::from)
}
