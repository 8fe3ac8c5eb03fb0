use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ContentProgress;
use crate::db::types::ContentType;

const COLUMNS: &str = "\
    id, student_id, course_id, content_type, content_id, completed, completed_at, updated_at";

pub(crate) struct UpsertProgress<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) course_id: i32,
    pub(crate) content_type: ContentType,
    pub(crate) content_id: i32,
    pub(crate) completed: bool,
    pub(crate) now: PrimitiveDateTime,
}

/// One row per (student, course, type, item). Re-marking an item keeps the
/// original completion time.
pub(crate) async fn upsert(
    pool: &PgPool,
    params: UpsertProgress<'_>,
) -> Result<ContentProgress, sqlx::Error> {
    let completed_at = params.completed.then_some(params.now);

    sqlx::query_as::<_, ContentProgress>(&format!(
        "INSERT INTO content_progress (
            student_id, course_id, content_type, content_id, completed, completed_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         ON CONFLICT (student_id, course_id, content_type, content_id) DO UPDATE SET
            completed = EXCLUDED.completed,
            completed_at = CASE
                WHEN EXCLUDED.completed THEN COALESCE(content_progress.completed_at, EXCLUDED.completed_at)
                ELSE NULL
            END,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(params.student_id)
    .bind(params.course_id)
    .bind(params.content_type)
    .bind(params.content_id)
    .bind(params.completed)
    .bind(completed_at)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_student_course(
    pool: &PgPool,
    student_id: &str,
    course_id: i32,
) -> Result<Vec<ContentProgress>, sqlx::Error> {
    sqlx::query_as::<_, ContentProgress>(&format!(
        "SELECT {COLUMNS} FROM content_progress
         WHERE student_id = $1 AND course_id = $2
         ORDER BY content_type, content_id"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_completed(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: i32,
    content_type: ContentType,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM content_progress
         WHERE student_id = $1 AND course_id = $2 AND content_type = $3 AND completed = TRUE",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(content_type)
    .fetch_one(executor)
    .await
}
