//! Session points and the personal library. Both are held in memory only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentIdentity, Identity};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::schemas::auth::MessageResponse;
use crate::schemas::library::{
    LibraryAddRequest, LibraryItemResponse, LibraryResponse, PointsAwardRequest,
    PointsAwardResponse, PointsResponse,
};
use crate::services::session_store::LibraryError;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/points/session", get(session_points))
        .route("/points/award", post(award_points))
        .route("/personal-library", get(list_library).post(add_to_library))
        .route("/personal-library/:item_id", delete(remove_from_library))
}

async fn session_points(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
) -> Json<PointsResponse> {
    let points = state.sessions().points(identity.session_key()).await;
    Json(PointsResponse { points })
}

async fn award_points(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(payload): Json<PointsAwardRequest>,
) -> Json<PointsAwardResponse> {
    let award = state.sessions().award(identity.session_key(), payload.action.trim()).await;
    tracing::debug!(action = %payload.action, awarded = award.awarded, "Session points awarded");

    Json(PointsAwardResponse {
        success: true,
        awarded: award.awarded,
        total: award.total,
        points: award.total,
    })
}

/// Library routes reject guests; points do not.
fn library_key(identity: &Identity) -> Result<&str, ApiError> {
    match identity {
        Identity::Guest => Err(ApiError::Unauthorized("Sign in to use your library")),
        Identity::User { .. } => Ok(identity.session_key()),
    }
}

async fn list_library(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let key = library_key(&identity)?;
    let books = state.sessions().library(key).await;

    Ok(Json(LibraryResponse {
        books: books.into_iter().map(LibraryItemResponse::from_item).collect(),
    }))
}

async fn add_to_library(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(payload): Json<LibraryAddRequest>,
) -> Result<(StatusCode, Json<LibraryItemResponse>), ApiError> {
    let key = library_key(&identity)?;
    let item = payload.into_item();
    item.validate()?;

    let stored = state
        .sessions()
        .add_to_library(key, item.into(), primitive_now_utc())
        .await
        .map_err(|err| match err {
            LibraryError::Duplicate => ApiError::Conflict(err.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(LibraryItemResponse::from_item(stored))))
}

async fn remove_from_library(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(item_id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let key = library_key(&identity)?;
    if !state.sessions().remove_from_library(key, item_id).await {
        return Err(ApiError::not_found("Library item"));
    }

    Ok(Json(MessageResponse::ok("Removed from library")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::User;
    use crate::db::types::UserRole;
    use time::macros::datetime;

    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::core::config::Settings;
    use crate::core::redis::RedisHandle;
    use crate::test_support;

    /// Guest requests never reach the database, so a lazy pool is enough.
    async fn guest_app() -> (axum::Router, tokio::sync::OwnedMutexGuard<()>) {
        let guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");
        let db =
            sqlx::PgPool::connect_lazy(&settings.database().database_url()).expect("lazy pool");
        let redis = RedisHandle::new(settings.redis().redis_url());
        let app = crate::api::router::router(AppState::new(settings, db, redis));
        (app, guard)
    }

    #[tokio::test]
    async fn guest_points_accumulate_under_shared_key() {
        let (app, _guard) = guest_app().await;

        for (action, total) in [("ai_commentary", 7), ("ai_summary", 12), ("read_chapter", 13)] {
            let response = app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/points/award",
                    None,
                    Some(json!({"action": action})),
                ))
                .await
                .expect("award");
            assert_eq!(response.status(), StatusCode::OK);
            let body = test_support::read_json(response).await;
            assert_eq!(body["total"], total);
        }

        let response = app
            .oneshot(test_support::json_request(Method::GET, "/api/points/session", None, None))
            .await
            .expect("points");
        let body = test_support::read_json(response).await;
        assert_eq!(body["points"], 13);
    }

    #[tokio::test]
    async fn guest_library_requests_are_unauthorized() {
        let (app, _guard) = guest_app().await;

        let response = app
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/personal-library",
                None,
                Some(json!({"bookData": {"title": "Confessions", "author": "Augustine"}})),
            ))
            .await
            .expect("add book");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn guests_have_no_library() {
        assert!(matches!(library_key(&Identity::Guest), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn library_is_keyed_by_token() {
        let identity = Identity::User {
            user: User {
                id: "student-1".to_string(),
                email: "lydia@example.org".to_string(),
                username: "lydia".to_string(),
                phone: None,
                hashed_password: String::new(),
                first_name: "Lydia".to_string(),
                last_name: String::new(),
                bio: None,
                gender: None,
                role: UserRole::Student,
                is_blocked: false,
                created_at: datetime!(2025-01-01 0:00),
                updated_at: datetime!(2025-01-01 0:00),
            },
            token: "tok-abc".to_string(),
        };
        assert_eq!(library_key(&identity).unwrap(), "tok-abc");
    }
}
