use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::AuthToken;

const COLUMNS: &str = "id, token_hash, user_id, expires_at, created_at";

pub(crate) struct CreateAuthToken<'a> {
    pub(crate) token_hash: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Drops every token the user holds and stores the new one, so a login
/// invalidates sessions on other devices.
pub(crate) async fn replace_for_user(
    pool: &PgPool,
    params: CreateAuthToken<'_>,
) -> Result<AuthToken, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
        .bind(params.user_id)
        .execute(&mut *tx)
        .await?;

    let token = sqlx::query_as::<_, AuthToken>(&format!(
        "INSERT INTO auth_tokens (token_hash, user_id, expires_at, created_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.token_hash)
    .bind(params.user_id)
    .bind(params.expires_at)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(token)
}

pub(crate) async fn find_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<AuthToken>, sqlx::Error> {
    sqlx::query_as::<_, AuthToken>(&format!(
        "SELECT {COLUMNS} FROM auth_tokens WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_for_user(pool: &PgPool, user_id: &str) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1").bind(user_id).execute(pool).await?;
    Ok(result.rows_affected())
}
