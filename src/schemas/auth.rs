use serde::Serialize;

use crate::schemas::user::UserResponse;

/// Returned by both register and login.
#[derive(Debug, Serialize)]
pub(crate) struct AuthResponse {
    pub(crate) success: bool,
    pub(crate) user: UserResponse,
    pub(crate) token: String,
    pub(crate) expires_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
}

impl MessageResponse {
    pub(crate) fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
