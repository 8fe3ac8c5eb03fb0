use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use validator::Validate;

use crate::api::courses::fetch_course;
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::EnrollmentStatus;
use crate::repositories;
use crate::schemas::auth::MessageResponse;
use crate::schemas::enrollment::{
    CertificateResponse, EnrollmentCreate, EnrollmentResponse, EnrollmentStatusUpdate,
    EnrollmentTransitionResponse, StudentEnrollmentResponse,
};
use crate::services::enrollment_completion::{self, CompletionSweep};
use crate::services::progress;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(enroll))
        .route("/student", get(list_student_enrollments))
        .route("/:course_id", delete(unenroll))
        .route("/student/:student_id/course/:course_id", delete(unenroll_student))
}

/// Mounted under `/admin`.
pub(crate) fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/enrollments/check-completions", post(check_completions))
        .route("/enrollments/:enrollment_id", patch(transition_enrollment))
}

async fn enroll(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<EnrollmentCreate>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let course = fetch_course(&state, payload.course_id).await?;
    if !course.is_active {
        return Err(ApiError::BadRequest("Course is not open for enrollment".to_string()));
    }

    let enrollment =
        repositories::enrollments::enroll(state.db(), &user.id, course.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to enroll"))?
            .ok_or_else(|| ApiError::Conflict("Already enrolled in this course".to_string()))?;

    metrics::record_enrollment_transition("active");
    tracing::info!(
        user_id = %user.id,
        course_id = course.id,
        action = "enroll",
        "Student enrolled"
    );

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

async fn list_student_enrollments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentEnrollmentResponse>>, ApiError> {
    let rows = repositories::enrollments::list_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    let mut enrollments = Vec::with_capacity(rows.len());
    for row in rows {
        let course_id = row.enrollment.course_id;
        let summary =
            progress::course_progress(state.db(), state.settings().progress(), &user.id, course_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to calculate course progress"))?;
        let assignments_submitted =
            repositories::assignments::count_submissions_for_student_course(
                state.db(),
                &user.id,
                course_id,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count assignment submissions"))?;

        enrollments.push(StudentEnrollmentResponse {
            enrollment: EnrollmentResponse::from_db(row.enrollment),
            course_name: row.course_name,
            course_description: row.course_description,
            duration_weeks: row.duration_weeks,
            progress: summary.percentage,
            assignments_submitted,
        });
    }

    Ok(Json(enrollments))
}

async fn unenroll(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    remove_enrollment(&state, &user.id, course_id).await?;
    Ok(Json(MessageResponse::ok("Unenrolled from course")))
}

async fn unenroll_student(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path((student_id, course_id)): Path<(String, i32)>,
) -> Result<Json<MessageResponse>, ApiError> {
    remove_enrollment(&state, &student_id, course_id).await?;
    tracing::info!(admin_id = %admin.id, user_id = %student_id, course_id, "Student unenrolled by admin");
    Ok(Json(MessageResponse::ok("Student unenrolled from course")))
}

async fn remove_enrollment(state: &AppState, student_id: &str, course_id: i32) -> Result<(), ApiError> {
    let removed = repositories::enrollments::unenroll(state.db(), student_id, course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to unenroll"))?;
    if !removed {
        return Err(ApiError::not_found("Enrollment"));
    }

    metrics::record_enrollment_transition("removed");
    tracing::info!(user_id = %student_id, course_id, action = "unenroll", "Enrollment removed");
    Ok(())
}

async fn transition_enrollment(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(enrollment_id): Path<i32>,
    Json(payload): Json<EnrollmentStatusUpdate>,
) -> Result<Json<EnrollmentTransitionResponse>, ApiError> {
    payload.validate()?;

    let enrollment = repositories::enrollments::find_by_id(state.db(), enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?
        .ok_or_else(|| ApiError::not_found("Enrollment"))?;

    if !enrollment.status.can_transition_to(payload.status) {
        return Err(ApiError::BadRequest(format!(
            "Cannot change enrollment from {} to {}",
            enrollment.status.as_str(),
            payload.status.as_str()
        )));
    }

    let no_longer_active =
        || ApiError::Conflict("Enrollment is no longer active".to_string());

    let response = match payload.status {
        EnrollmentStatus::Completed => {
            let (updated, certificate) = enrollment_completion::complete_enrollment(
                state.db(),
                &enrollment,
                payload.grade,
                primitive_now_utc(),
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to complete enrollment"))?
            .ok_or_else(no_longer_active)?;

            EnrollmentTransitionResponse {
                enrollment: EnrollmentResponse::from_db(updated),
                certificate: certificate.map(CertificateResponse::from_db),
            }
        }
        EnrollmentStatus::Dropped => {
            let updated = repositories::enrollments::finish(
                state.db(),
                enrollment.id,
                EnrollmentStatus::Dropped,
                payload.grade,
                None,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to drop enrollment"))?
            .ok_or_else(no_longer_active)?;

            metrics::record_enrollment_transition("dropped");
            EnrollmentTransitionResponse {
                enrollment: EnrollmentResponse::from_db(updated),
                certificate: None,
            }
        }
        EnrollmentStatus::Active => {
            return Err(ApiError::BadRequest("Enrollment is already active".to_string()))
        }
    };

    tracing::info!(
        admin_id = %admin.id,
        enrollment_id,
        status = payload.status.as_str(),
        action = "enrollment_transition",
        "Enrollment status changed"
    );

    Ok(Json(response))
}

async fn check_completions(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<CompletionSweep>, ApiError> {
    let sweep = enrollment_completion::check_all(state.db(), state.settings().progress())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment completions"))?;

    Ok(Json(sweep))
}

#[cfg(test)]
mod tests;
