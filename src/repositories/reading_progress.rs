use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ReadingProgress;

const COLUMNS: &str = "\
    user_id, course_id, chapter_index, page_index, total_pages, completion_percentage, last_read_at";

pub(crate) struct SaveReadingProgress<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) course_id: i32,
    pub(crate) chapter_index: i32,
    pub(crate) page_index: i32,
    pub(crate) total_pages: i32,
    pub(crate) completion_percentage: f64,
    pub(crate) last_read_at: PrimitiveDateTime,
}

pub(crate) async fn save(
    pool: &PgPool,
    params: SaveReadingProgress<'_>,
) -> Result<ReadingProgress, sqlx::Error> {
    sqlx::query_as::<_, ReadingProgress>(&format!(
        "INSERT INTO reading_progress (
            user_id, course_id, chapter_index, page_index, total_pages,
            completion_percentage, last_read_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         ON CONFLICT (user_id, course_id) DO UPDATE SET
            chapter_index = EXCLUDED.chapter_index,
            page_index = EXCLUDED.page_index,
            total_pages = EXCLUDED.total_pages,
            completion_percentage = EXCLUDED.completion_percentage,
            last_read_at = EXCLUDED.last_read_at
         RETURNING {COLUMNS}"
    ))
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.chapter_index)
    .bind(params.page_index)
    .bind(params.total_pages)
    .bind(params.completion_percentage)
    .bind(params.last_read_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: i32,
) -> Result<Option<ReadingProgress>, sqlx::Error> {
    sqlx::query_as::<_, ReadingProgress>(&format!(
        "SELECT {COLUMNS} FROM reading_progress WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}
