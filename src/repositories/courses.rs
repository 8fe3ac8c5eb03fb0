use sqlx::PgPool;

use crate::db::models::Course;

const COURSE_COLUMNS: &str = "\
    id, name, description, duration_weeks, instructor_id, is_active, \
    category, difficulty, points, created_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) duration_weeks: i32,
    pub(crate) instructor_id: Option<&'a str>,
    pub(crate) is_active: bool,
    pub(crate) category: Option<&'a str>,
    pub(crate) difficulty: Option<&'a str>,
    pub(crate) points: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Course row plus the enrollment counters shown on dashboards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CourseWithStats {
    #[sqlx(flatten)]
    pub(crate) course: Course,
    pub(crate) enrollment_count: i64,
    pub(crate) completed_count: i64,
    pub(crate) active_count: i64,
}

pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            name, description, duration_weeks, instructor_id, is_active,
            category, difficulty, points, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.description)
    .bind(params.duration_weeks)
    .bind(params.instructor_id)
    .bind(params.is_active)
    .bind(params.category)
    .bind(params.difficulty)
    .bind(params.points)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: i32,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE is_active = TRUE ORDER BY id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_with_stats(pool: &PgPool) -> Result<Vec<CourseWithStats>, sqlx::Error> {
    sqlx::query_as::<_, CourseWithStats>(
        "SELECT c.id, c.name, c.description, c.duration_weeks, c.instructor_id, c.is_active,
                c.category, c.difficulty, c.points, c.created_at,
                COUNT(e.id) AS enrollment_count,
                COUNT(e.id) FILTER (WHERE e.status = 'completed') AS completed_count,
                COUNT(e.id) FILTER (WHERE e.status = 'active') AS active_count
         FROM courses c
         LEFT JOIN enrollments e ON e.course_id = c.id
         GROUP BY c.id
         ORDER BY c.id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn toggle_active(
    pool: &PgPool,
    course_id: i32,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET is_active = NOT is_active WHERE id = $1 RETURNING {COURSE_COLUMNS}"
    ))
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses").fetch_one(pool).await
}
