use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState, time::primitive_now_utc};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::session_store::GUEST_KEY;

pub(crate) const AUTH_COOKIE: &str = "authToken";
pub(crate) const LEGACY_AUTH_COOKIE: &str = "auth_token";

/// Who is calling. Unknown, expired or missing tokens all resolve to `Guest`.
#[derive(Debug, Clone)]
pub(crate) enum Identity {
    Guest,
    User { user: User, token: String },
}

impl Identity {
    pub(crate) fn user(&self) -> Option<&User> {
        match self {
            Identity::Guest => None,
            Identity::User { user, .. } => Some(user),
        }
    }

    /// Key for the in-memory session store.
    pub(crate) fn session_key(&self) -> &str {
        match self {
            Identity::Guest => GUEST_KEY,
            Identity::User { token, .. } => token,
        }
    }
}

pub(crate) struct CurrentIdentity(pub(crate) Identity);
pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

/// Bearer header first, then the `authToken` cookie, then `auth_token`.
pub(crate) fn presented_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let jar = CookieJar::from_headers(headers);
    [AUTH_COOKIE, LEGACY_AUTH_COOKIE]
        .into_iter()
        .filter_map(|name| jar.get(name))
        .map(|cookie| cookie.value().trim().to_string())
        .find(|token| !token.is_empty())
}

pub(crate) async fn resolve_identity(state: &AppState, token: Option<String>) -> Result<Identity, ApiError> {
    let Some(token) = token else {
        return Ok(Identity::Guest);
    };

    let token_hash = security::hash_auth_token(&token);
    let stored = repositories::auth_tokens::find_by_hash(state.db(), &token_hash)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up auth token"))?;

    let Some(stored) = stored else {
        return Ok(Identity::Guest);
    };

    if stored.expires_at <= primitive_now_utc() {
        repositories::auth_tokens::delete_by_hash(state.db(), &token_hash)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete expired auth token"))?;
        tracing::debug!(user_id = %stored.user_id, "Expired auth token removed");
        return Ok(Identity::Guest);
    }

    let user = repositories::users::find_by_id(state.db(), &stored.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    Ok(match user {
        Some(user) => Identity::User { user, token },
        None => Identity::Guest,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let identity = resolve_identity(&app_state, presented_token(&parts.headers)).await?;
        Ok(CurrentIdentity(identity))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;

        let Identity::User { user, .. } = identity else {
            return Err(ApiError::Unauthorized("Not authenticated"));
        };

        if user.is_blocked {
            return Err(ApiError::Forbidden("Account is blocked"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role.is_staff() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

/// Staff may grade anything; instructors need an active grant on the course.
pub(crate) async fn require_course_grader(
    state: &AppState,
    user: &User,
    course_id: i32,
) -> Result<(), ApiError> {
    if user.role.is_staff() {
        return Ok(());
    }

    if user.role != UserRole::Instructor {
        return Err(ApiError::Forbidden("Instructor access required"));
    }

    let granted =
        repositories::instructor_permissions::has_active(state.db(), &user.id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check instructor permissions"))?;

    if granted {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not enough permissions for this course"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_wins_over_cookies() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer header-token"),
            (header::COOKIE, "authToken=cookie-token"),
        ]);
        assert_eq!(presented_token(&map).as_deref(), Some("header-token"));
    }

    #[test]
    fn camel_case_cookie_wins_over_legacy_cookie() {
        let map = headers(&[(header::COOKIE, "auth_token=legacy; authToken=primary")]);
        assert_eq!(presented_token(&map).as_deref(), Some("primary"));
    }

    #[test]
    fn legacy_cookie_is_used_alone() {
        let map = headers(&[(header::COOKIE, "theme=dark; auth_token=legacy")]);
        assert_eq!(presented_token(&map).as_deref(), Some("legacy"));
    }

    #[test]
    fn missing_or_malformed_credentials_yield_none() {
        assert_eq!(presented_token(&HeaderMap::new()), None);
        let basic = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(presented_token(&basic), None);
        let empty = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
        assert_eq!(presented_token(&empty), None);
    }

    #[test]
    fn guest_identity_uses_guest_session_key() {
        assert_eq!(Identity::Guest.session_key(), GUEST_KEY);
        assert!(Identity::Guest.user().is_none());
    }
}
