use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentIdentity, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Course;
use crate::db::types::EnrollmentStatus;
use crate::repositories;
use crate::schemas::course::{
    AssignmentResponse, AssignmentSubmitRequest, CourseDetailResponse, CourseResponse,
    ModuleResponse, ReadingResponse, SubmissionResponse, VideoResponse,
};
use crate::schemas::quiz::StudentQuizResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/:course_id", get(get_course))
        .route("/:course_id/videos", get(list_videos))
        .route("/:course_id/readings", get(list_readings))
        .route("/:course_id/quizzes", get(list_quizzes))
        .route("/:course_id/assignments", get(list_assignments))
        .route("/assignments/:assignment_id/submit", post(submit_assignment))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let course = fetch_course(&state, course_id).await?;
    let modules = repositories::course_modules::list_for_course(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list course modules"))?;

    Ok(Json(CourseDetailResponse {
        course: CourseResponse::from_db(course),
        modules: modules.into_iter().map(ModuleResponse::from_db).collect(),
    }))
}

async fn list_videos(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<VideoResponse>>, ApiError> {
    fetch_course(&state, course_id).await?;
    let videos = repositories::course_videos::list_published_for_course(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list videos"))?;

    Ok(Json(videos.into_iter().map(VideoResponse::from_db).collect()))
}

async fn list_readings(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<ReadingResponse>>, ApiError> {
    fetch_course(&state, course_id).await?;
    let readings = repositories::course_readings::list_active_for_course(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list readings"))?;

    Ok(Json(readings.into_iter().map(ReadingResponse::from_db).collect()))
}

async fn list_quizzes(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<StudentQuizResponse>>, ApiError> {
    fetch_course(&state, course_id).await?;
    let quizzes = repositories::quizzes::list_published_for_course(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    let stats = match identity.user() {
        Some(user) => repositories::quiz_attempts::stats_for_student(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load quiz attempt stats"))?
            .into_iter()
            .map(|row| (row.quiz_id, row))
            .collect(),
        None => HashMap::new(),
    };

    Ok(Json(quizzes.into_iter().map(|quiz| StudentQuizResponse::build(quiz, &stats)).collect()))
}

async fn list_assignments(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    fetch_course(&state, course_id).await?;
    let assignments = repositories::assignments::list_for_course(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    Ok(Json(assignments.into_iter().map(AssignmentResponse::from_db).collect()))
}

async fn submit_assignment(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<i32>,
    Json(payload): Json<AssignmentSubmitRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate()?;

    let assignment = repositories::assignments::find_by_id(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?
        .ok_or_else(|| ApiError::not_found("Assignment"))?;

    let enrollment =
        repositories::enrollments::find(state.db(), &user.id, assignment.course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?;
    if !enrollment.is_some_and(|row| row.status == EnrollmentStatus::Active) {
        return Err(ApiError::Forbidden("Enroll in the course to submit assignments"));
    }

    let submission = repositories::assignments::submit(
        state.db(),
        assignment.id,
        &user.id,
        payload.content.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to submit assignment"))?;

    tracing::info!(
        user_id = %user.id,
        course_id = assignment.course_id,
        assignment_id,
        action = "submit_assignment",
        "Assignment submitted"
    );

    Ok(Json(SubmissionResponse::from_db(submission)))
}

pub(crate) async fn fetch_course(state: &AppState, course_id: i32) -> Result<Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::not_found("Course"))
}

#[cfg(test)]
mod tests;
