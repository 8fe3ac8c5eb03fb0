use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Creates the configured dean account, or brings an existing one back in line
/// with the configured password and role.
pub(crate) async fn ensure_dean(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_dean_password.is_empty() {
        tracing::warn!("FIRST_DEAN_PASSWORD not configured; skipping dean creation");
        return Ok(());
    }

    let username = &admin.first_dean_username;
    let user = repositories::users::find_by_username(state.db(), username).await?;
    let now = primitive_now_utc();

    if let Some(user) = user {
        let verified = security::verify_password(&admin.first_dean_password, &user.hashed_password)
            .unwrap_or(false);
        if verified && user.role == UserRole::Dean && !user.is_blocked {
            tracing::info!("Default dean already up to date");
            return Ok(());
        }

        let hashed_password = if verified {
            user.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_dean_password)?
        };
        repositories::users::reset_credentials(
            state.db(),
            &user.id,
            &hashed_password,
            UserRole::Dean,
            now,
        )
        .await?;

        tracing::info!("Updated default dean {username}");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_dean_password)?;
    let id = Uuid::new_v4().to_string();
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &id,
            email: &admin.first_dean_email,
            username,
            phone: None,
            hashed_password,
            first_name: "Ministry",
            last_name: "Dean",
            gender: None,
            role: UserRole::Dean,
            created_at: now,
        },
    )
    .await?;

    tracing::info!("Created default dean {username}");
    Ok(())
}
