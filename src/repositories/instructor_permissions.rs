use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::InstructorPermission;

const COLUMNS: &str = "\
    id, instructor_id, course_id, granted_by_id, permissions, is_active, granted_at, revoked_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PermissionView {
    #[sqlx(flatten)]
    pub(crate) permission: InstructorPermission,
    pub(crate) instructor_name: String,
    pub(crate) course_name: String,
}

pub(crate) struct GrantPermission<'a> {
    pub(crate) instructor_id: &'a str,
    pub(crate) course_id: i32,
    pub(crate) granted_by_id: &'a str,
    pub(crate) permissions: &'a [String],
    pub(crate) granted_at: PrimitiveDateTime,
}

/// Revokes any active grant for the same (instructor, course) and stores the
/// new one, so at most one grant per pair is active.
pub(crate) async fn grant(
    pool: &PgPool,
    params: GrantPermission<'_>,
) -> Result<InstructorPermission, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE instructor_permissions
         SET is_active = FALSE, revoked_at = $1
         WHERE instructor_id = $2 AND course_id = $3 AND is_active = TRUE",
    )
    .bind(params.granted_at)
    .bind(params.instructor_id)
    .bind(params.course_id)
    .execute(&mut *tx)
    .await?;

    let permission = sqlx::query_as::<_, InstructorPermission>(&format!(
        "INSERT INTO instructor_permissions (
            instructor_id, course_id, granted_by_id, permissions, is_active, granted_at
         ) VALUES ($1,$2,$3,$4,TRUE,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.instructor_id)
    .bind(params.course_id)
    .bind(params.granted_by_id)
    .bind(params.permissions)
    .bind(params.granted_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(permission)
}

pub(crate) async fn revoke(
    pool: &PgPool,
    permission_id: i32,
    revoked_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE instructor_permissions
         SET is_active = FALSE, revoked_at = $1
         WHERE id = $2 AND is_active = TRUE",
    )
    .bind(revoked_at)
    .bind(permission_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<PermissionView>, sqlx::Error> {
    sqlx::query_as::<_, PermissionView>(
        "SELECT p.id, p.instructor_id, p.course_id, p.granted_by_id, p.permissions,
                p.is_active, p.granted_at, p.revoked_at,
                TRIM(u.first_name || ' ' || u.last_name) AS instructor_name,
                c.name AS course_name
         FROM instructor_permissions p
         JOIN users u ON u.id = p.instructor_id
         JOIN courses c ON c.id = p.course_id
         WHERE p.is_active = TRUE
         ORDER BY p.granted_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn has_active(
    pool: &PgPool,
    instructor_id: &str,
    course_id: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM instructor_permissions
            WHERE instructor_id = $1 AND course_id = $2 AND is_active = TRUE
         )",
    )
    .bind(instructor_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}
