use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::courses::fetch_course;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::progress::{
    ContentProgressResponse, ContentProgressUpdate, ReadingProgressResponse, ReadingProgressUpdate,
};
use crate::services::progress::{self, CourseProgress, GpaSummary};

/// Merged at the API root; the paths span several prefixes.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/content-progress", post(mark_content))
        .route("/content-progress/:course_id", get(list_content_progress))
        .route("/reading-progress", post(save_reading_progress))
        .route("/reading-progress/:course_id", get(get_reading_progress))
        .route("/progress/:course_id", get(course_progress))
        .route("/analytics/gpa", get(student_gpa))
}

async fn mark_content(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ContentProgressUpdate>,
) -> Result<Json<ContentProgressResponse>, ApiError> {
    payload.validate()?;
    fetch_course(&state, payload.course_id).await?;

    let row = repositories::content_progress::upsert(
        state.db(),
        repositories::content_progress::UpsertProgress {
            student_id: &user.id,
            course_id: payload.course_id,
            content_type: payload.content_type,
            content_id: payload.content_id,
            completed: payload.completed,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save content progress"))?;

    tracing::debug!(
        user_id = %user.id,
        course_id = payload.course_id,
        content_type = ?payload.content_type,
        content_id = payload.content_id,
        completed = payload.completed,
        "Content progress saved"
    );

    Ok(Json(ContentProgressResponse::from_db(row)))
}

async fn list_content_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<ContentProgressResponse>>, ApiError> {
    let rows =
        repositories::content_progress::list_for_student_course(state.db(), &user.id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load content progress"))?;

    Ok(Json(rows.into_iter().map(ContentProgressResponse::from_db).collect()))
}

async fn save_reading_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ReadingProgressUpdate>,
) -> Result<Json<ReadingProgressResponse>, ApiError> {
    payload.validate()?;
    fetch_course(&state, payload.course_id).await?;

    let completion_percentage = progress::reading_completion_percentage(
        payload.chapter_index,
        payload.page_index,
        payload.total_pages,
    );

    let row = repositories::reading_progress::save(
        state.db(),
        repositories::reading_progress::SaveReadingProgress {
            user_id: &user.id,
            course_id: payload.course_id,
            chapter_index: payload.chapter_index,
            page_index: payload.page_index,
            total_pages: payload.total_pages,
            completion_percentage,
            last_read_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save reading progress"))?;

    Ok(Json(ReadingProgressResponse::from_db(row)))
}

/// `null` until the student opens the book for the first time.
async fn get_reading_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Option<ReadingProgressResponse>>, ApiError> {
    let row = repositories::reading_progress::find(state.db(), &user.id, course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load reading progress"))?;

    Ok(Json(row.map(ReadingProgressResponse::from_db)))
}

async fn course_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<CourseProgress>, ApiError> {
    fetch_course(&state, course_id).await?;

    let summary =
        progress::course_progress(state.db(), state.settings().progress(), &user.id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to calculate course progress"))?;

    Ok(Json(summary))
}

async fn student_gpa(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GpaSummary>, ApiError> {
    let summary = progress::student_gpa(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to calculate GPA"))?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests;
