use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Announcement;

const COLUMNS: &str =
    "id, title, content, announcement_type, is_active, show_until, created_by, created_at";

pub(crate) struct CreateAnnouncement<'a> {
    pub(crate) title: &'a str,
    pub(crate) content: &'a str,
    pub(crate) announcement_type: &'a str,
    pub(crate) show_until: Option<PrimitiveDateTime>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAnnouncement<'_>,
) -> Result<Announcement, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(&format!(
        "INSERT INTO announcements (
            title, content, announcement_type, is_active, show_until, created_by, created_at
         ) VALUES ($1,$2,$3,TRUE,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.content)
    .bind(params.announcement_type)
    .bind(params.show_until)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_visible(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Vec<Announcement>, sqlx::Error> {
    sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {COLUMNS} FROM announcements
         WHERE is_active = TRUE AND (show_until IS NULL OR show_until > $1)
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(now)
    .fetch_all(pool)
    .await
}

pub(crate) async fn deactivate(pool: &PgPool, announcement_id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE announcements SET is_active = FALSE WHERE id = $1")
        .bind(announcement_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
