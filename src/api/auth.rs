use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{presented_token, CurrentUser, AUTH_COOKIE, LEGACY_AUTH_COOKIE};
use crate::core::config::SecuritySettings;
use crate::core::redis::auth_rate_key;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::core::{metrics, security};
use crate::core::state::AppState;
use crate::db::is_unique_violation;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::{AuthResponse, MessageResponse};
use crate::schemas::user::{LoginRequest, ProfileUpdate, RegisterRequest, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/user", get(current_user))
        .route("/logout", post(logout))
        .route("/profile", put(update_profile))
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    payload.validate()?;

    if payload.role.is_some_and(|role| role != UserRole::Student) {
        return Err(ApiError::BadRequest("Only student accounts can be self-registered".to_string()));
    }

    check_rate_limit(&state, "register", &payload.email).await?;

    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim();

    let taken = repositories::users::email_or_username_taken(state.db(), &email, username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if taken {
        return Err(ApiError::Conflict("Email or username already in use".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let phone = payload.phone.as_deref().map(str::trim).filter(|phone| !phone.is_empty());
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            username,
            phone,
            hashed_password,
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
            gender: payload.gender.as_deref(),
            role: UserRole::Student,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Email, username or phone already in use".to_string())
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })?;

    tracing::info!(user_id = %user.id, action = "register", "Student registered");

    let (jar, response) = start_session(&state, jar, user, payload.keep_logged_in).await?;
    Ok((StatusCode::CREATED, jar, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    payload.validate()?;
    check_rate_limit(&state, "login", &payload.identifier).await?;

    let user = repositories::users::find_by_identifier(state.db(), payload.identifier.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    let Some(user) = user else {
        metrics::record_login("invalid_credentials");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    };

    let verified =
        security::verify_password(&payload.password, &user.hashed_password).unwrap_or(false);
    if !verified {
        metrics::record_login("invalid_credentials");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    if user.is_blocked {
        metrics::record_login("blocked");
        return Err(ApiError::Forbidden("Account is blocked"));
    }

    metrics::record_login("success");
    tracing::info!(user_id = %user.id, action = "login", "User logged in");

    let (jar, response) = start_session(&state, jar, user, payload.keep_logged_in).await?;
    Ok((jar, Json(response)))
}

async fn current_user(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    if let Some(token) = presented_token(&headers) {
        let removed =
            repositories::auth_tokens::delete_by_hash(state.db(), &security::hash_auth_token(&token))
                .await
                .map_err(|e| ApiError::internal(e, "Failed to revoke auth token"))?;
        tracing::debug!(removed, "Logout processed");
    }

    let security = state.settings().security();
    let jar = jar
        .add(expired_cookie(AUTH_COOKIE, security))
        .add(expired_cookie(LEGACY_AUTH_COOKIE, security));

    Ok((jar, Json(MessageResponse::ok("Logged out successfully"))))
}

async fn update_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate()?;

    let updated = repositories::users::update_profile(
        state.db(),
        &user.id,
        repositories::users::UpdateProfile {
            first_name: payload.first_name.map(|value| value.trim().to_string()),
            last_name: payload.last_name.map(|value| value.trim().to_string()),
            bio: payload.bio,
            phone: payload
                .phone
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            gender: payload.gender,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Phone number already in use".to_string())
        } else {
            ApiError::internal(e, "Failed to update profile")
        }
    })?;

    Ok(Json(UserResponse::from_db(updated)))
}

async fn check_rate_limit(state: &AppState, action: &str, identifier: &str) -> Result<(), ApiError> {
    let security = state.settings().security();
    let allowed = state
        .redis()
        .rate_limit(
            &auth_rate_key(action, identifier),
            security.auth_rate_limit,
            security.auth_rate_window_seconds,
        )
        .await
        .unwrap_or(true);

    if allowed {
        Ok(())
    } else {
        metrics::record_login("rate_limited");
        Err(ApiError::TooManyRequests("Too many attempts, try again later"))
    }
}

/// Replaces the user's tokens with a fresh one and sets both auth cookies.
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
    keep_logged_in: bool,
) -> Result<(CookieJar, AuthResponse), ApiError> {
    let security = state.settings().security();
    let token = security::generate_auth_token();
    let now = primitive_now_utc();
    let expires_at = security::token_expiry(now, security, keep_logged_in);

    repositories::auth_tokens::replace_for_user(
        state.db(),
        repositories::auth_tokens::CreateAuthToken {
            token_hash: &security::hash_auth_token(&token),
            user_id: &user.id,
            expires_at,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store auth token"))?;

    let jar = jar
        .add(session_cookie(AUTH_COOKIE, token.clone(), security, keep_logged_in))
        .add(session_cookie(LEGACY_AUTH_COOKIE, token.clone(), security, keep_logged_in));

    Ok((
        jar,
        AuthResponse {
            success: true,
            user: UserResponse::from_db(user),
            token,
            expires_at: format_primitive(expires_at),
        },
    ))
}

fn session_cookie(
    name: &'static str,
    token: String,
    security: &SecuritySettings,
    keep_logged_in: bool,
) -> Cookie<'static> {
    Cookie::build((name, token))
        .path("/")
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(security::token_lifetime(security, keep_logged_in))
        .build()
}

fn expired_cookie(name: &'static str, security: &SecuritySettings) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}
