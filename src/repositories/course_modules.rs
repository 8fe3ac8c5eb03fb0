use sqlx::PgPool;

use crate::db::models::CourseModule;
use crate::db::types::ContentType;

const COLUMNS: &str =
    "id, course_id, title, description, order_index, week_number, module_type, created_at";

pub(crate) struct CreateModule<'a> {
    pub(crate) course_id: i32,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) order_index: i32,
    pub(crate) week_number: Option<i32>,
    pub(crate) module_type: Option<ContentType>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateModule<'_>,
) -> Result<CourseModule, sqlx::Error> {
    sqlx::query_as::<_, CourseModule>(&format!(
        "INSERT INTO course_modules (
            course_id, title, description, order_index, week_number, module_type, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.order_index)
    .bind(params.week_number)
    .bind(params.module_type)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: i32,
) -> Result<Vec<CourseModule>, sqlx::Error> {
    sqlx::query_as::<_, CourseModule>(&format!(
        "SELECT {COLUMNS} FROM course_modules
         WHERE course_id = $1
         ORDER BY order_index, id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Ensures a module referenced by new content belongs to the same course.
pub(crate) async fn belongs_to_course(
    pool: &PgPool,
    module_id: i32,
    course_id: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM course_modules WHERE id = $1 AND course_id = $2)",
    )
    .bind(module_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}
