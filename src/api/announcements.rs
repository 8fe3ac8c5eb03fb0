use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::{parse_rfc3339_utc, primitive_now_utc};
use crate::repositories;
use crate::schemas::auth::MessageResponse;
use crate::schemas::library::{AnnouncementCreate, AnnouncementResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/announcements", get(list_announcements))
}

/// Nested under `/admin`.
pub(crate) fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/announcements", post(create_announcement))
        .route("/announcements/:announcement_id", delete(deactivate_announcement))
}

async fn list_announcements(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnnouncementResponse>>, ApiError> {
    let announcements = repositories::announcements::list_visible(state.db(), primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list announcements"))?;

    Ok(Json(announcements.into_iter().map(AnnouncementResponse::from_db).collect()))
}

async fn create_announcement(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AnnouncementCreate>,
) -> Result<(StatusCode, Json<AnnouncementResponse>), ApiError> {
    payload.validate()?;

    let show_until = payload
        .show_until
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(parse_rfc3339_utc)
        .transpose()
        .map_err(|_| ApiError::BadRequest("show_until must be an RFC 3339 timestamp".to_string()))?;

    let announcement = repositories::announcements::create(
        state.db(),
        repositories::announcements::CreateAnnouncement {
            title: payload.title.trim(),
            content: &payload.content,
            announcement_type: payload.announcement_type.trim(),
            show_until,
            created_by: &admin.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create announcement"))?;

    tracing::info!(
        admin_id = %admin.id,
        announcement_id = announcement.id,
        action = "create_announcement",
        "Announcement published"
    );
    Ok((StatusCode::CREATED, Json(AnnouncementResponse::from_db(announcement))))
}

async fn deactivate_announcement(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(announcement_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deactivated = repositories::announcements::deactivate(state.db(), announcement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to deactivate announcement"))?;
    if !deactivated {
        return Err(ApiError::not_found("Announcement"));
    }

    tracing::info!(admin_id = %admin.id, announcement_id, action = "deactivate_announcement", "Announcement withdrawn");
    Ok(Json(MessageResponse::ok("Announcement deactivated")))
}
