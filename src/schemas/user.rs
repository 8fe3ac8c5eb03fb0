use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub(crate) email: String,
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub(crate) username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub(crate) password: String,
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub(crate) first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub(crate) last_name: String,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) gender: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default)]
    #[serde(alias = "keepLoggedIn")]
    pub(crate) keep_logged_in: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    /// Email, username or phone.
    #[serde(alias = "email", alias = "username", alias = "phone")]
    #[validate(length(min = 1, message = "Email, username or phone is required"))]
    pub(crate) identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub(crate) password: String,
    #[serde(default)]
    #[serde(alias = "keepLoggedIn")]
    pub(crate) keep_logged_in: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default)]
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, max = 100, message = "First name must not be empty"))]
    pub(crate) first_name: Option<String>,
    #[serde(default)]
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, max = 100, message = "Last name must not be empty"))]
    pub(crate) last_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Bio is too long"))]
    pub(crate) bio: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleUpdate {
    pub(crate) role: UserRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) skip: Option<i64>,
    #[serde(default)]
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) phone: Option<String>,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) full_name: String,
    pub(crate) bio: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) is_blocked: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            phone: user.phone,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            bio: user.bio,
            gender: user.gender,
            role: user.role,
            is_blocked: user.is_blocked,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleCount {
    pub(crate) role: UserRole,
    pub(crate) count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserStatsResponse {
    pub(crate) total: i64,
    pub(crate) by_role: Vec<RoleCount>,
}
