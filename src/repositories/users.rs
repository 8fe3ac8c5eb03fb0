use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::User;
use crate::db::types::UserRole;

pub(crate) const COLUMNS: &str = "\
    id, email, username, phone, hashed_password, first_name, last_name, \
    bio, gender, role, is_blocked, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Login accepts an email, a username or a phone number.
pub(crate) async fn find_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users
         WHERE lower(email) = lower($1) OR lower(username) = lower($1) OR phone = $1
         ORDER BY (lower(email) = lower($1)) DESC
         LIMIT 1"
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE lower(username) = lower($1)"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn email_or_username_taken(
    pool: &PgPool,
    email: &str,
    username: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM users WHERE lower(email) = lower($1) OR lower(username) = lower($2)
         )",
    )
    .bind(email)
    .bind(username)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) email: &'a str,
    pub(crate) username: &'a str,
    pub(crate) phone: Option<&'a str>,
    pub(crate) hashed_password: String,
    pub(crate) first_name: &'a str,
    pub(crate) last_name: &'a str,
    pub(crate) gender: Option<&'a str>,
    pub(crate) role: UserRole,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, username, phone, hashed_password, first_name, last_name,
            gender, role, is_blocked, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,FALSE,$10,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.username)
    .bind(params.phone)
    .bind(params.hashed_password)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.gender)
    .bind(params.role)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateProfile {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) bio: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update_profile(
    pool: &PgPool,
    id: &str,
    params: UpdateProfile,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            bio = COALESCE($3, bio),
            phone = COALESCE($4, phone),
            gender = COALESCE($5, gender),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}"
    ))
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.bio)
    .bind(params.phone)
    .bind(params.gender)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_role(
    pool: &PgPool,
    id: &str,
    role: UserRole,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}"
    ))
    .bind(role)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn toggle_blocked(
    pool: &PgPool,
    id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_blocked = NOT is_blocked, updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Used by bootstrap to keep the configured dean account in sync.
pub(crate) async fn reset_credentials(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    role: UserRole,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users
         SET hashed_password = $1, role = $2, is_blocked = FALSE, updated_at = $3
         WHERE id = $4",
    )
    .bind(hashed_password)
    .bind(role)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Default)]
pub(crate) struct UserFilter {
    pub(crate) role: Option<UserRole>,
    pub(crate) search: Option<String>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(pool: &PgPool, filter: &UserFilter) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users"));
    let mut has_where = false;

    if let Some(role) = filter.role {
        builder.push(" WHERE role = ");
        builder.push_bind(role);
        has_where = true;
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.push(if has_where { " AND " } else { " WHERE " });
        let pattern = format!("%{}%", search.to_lowercase());
        builder.push("(lower(email) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(username) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(first_name || ' ' || last_name) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(filter.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(filter.limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count_by_role(pool: &PgPool) -> Result<Vec<(UserRole, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (UserRole, i64)>(
        "SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role",
    )
    .fetch_all(pool)
    .await
}
