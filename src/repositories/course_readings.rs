use sqlx::PgPool;

use crate::db::models::CourseReading;

const COLUMNS: &str = "\
    id, course_id, title, author, content_url, reading_type, order_index, is_active, created_at";

pub(crate) struct CreateReading<'a> {
    pub(crate) course_id: i32,
    pub(crate) title: &'a str,
    pub(crate) author: Option<&'a str>,
    pub(crate) content_url: Option<&'a str>,
    pub(crate) reading_type: &'a str,
    pub(crate) order_index: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ReadingWithCourse {
    #[sqlx(flatten)]
    pub(crate) reading: CourseReading,
    pub(crate) course_name: String,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateReading<'_>,
) -> Result<CourseReading, sqlx::Error> {
    sqlx::query_as::<_, CourseReading>(&format!(
        "INSERT INTO course_readings (
            course_id, title, author, content_url, reading_type, order_index, is_active, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,TRUE,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.author)
    .bind(params.content_url)
    .bind(params.reading_type)
    .bind(params.order_index)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_active_for_course(
    pool: &PgPool,
    course_id: i32,
) -> Result<Vec<CourseReading>, sqlx::Error> {
    sqlx::query_as::<_, CourseReading>(&format!(
        "SELECT {COLUMNS} FROM course_readings
         WHERE course_id = $1 AND is_active = TRUE
         ORDER BY order_index, id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all_with_course(
    pool: &PgPool,
) -> Result<Vec<ReadingWithCourse>, sqlx::Error> {
    sqlx::query_as::<_, ReadingWithCourse>(
        "SELECT r.id, r.course_id, r.title, r.author, r.content_url, r.reading_type,
                r.order_index, r.is_active, r.created_at,
                c.name AS course_name
         FROM course_readings r
         JOIN courses c ON c.id = r.course_id
         ORDER BY r.course_id, r.order_index, r.id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_active_for_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM course_readings WHERE course_id = $1 AND is_active = TRUE",
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}
