use sqlx::PgPool;

use crate::db::models::CourseRequirements;
use crate::db::types::ReadingSource;

const COLUMNS: &str = "\
    course_id, required_readings, required_quizzes, required_videos, \
    completion_quizzes, completion_essays, reading_source, updated_at";

pub(crate) async fn find_for_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: i32,
) -> Result<Option<CourseRequirements>, sqlx::Error> {
    sqlx::query_as::<_, CourseRequirements>(&format!(
        "SELECT {COLUMNS} FROM course_requirements WHERE course_id = $1"
    ))
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) struct UpsertRequirements {
    pub(crate) course_id: i32,
    pub(crate) required_readings: i32,
    pub(crate) required_quizzes: i32,
    pub(crate) required_videos: i32,
    pub(crate) completion_quizzes: i32,
    pub(crate) completion_essays: i32,
    pub(crate) reading_source: ReadingSource,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn upsert(
    pool: &PgPool,
    params: UpsertRequirements,
) -> Result<CourseRequirements, sqlx::Error> {
    sqlx::query_as::<_, CourseRequirements>(&format!(
        "INSERT INTO course_requirements (
            course_id, required_readings, required_quizzes, required_videos,
            completion_quizzes, completion_essays, reading_source, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         ON CONFLICT (course_id) DO UPDATE SET
            required_readings = EXCLUDED.required_readings,
            required_quizzes = EXCLUDED.required_quizzes,
            required_videos = EXCLUDED.required_videos,
            completion_quizzes = EXCLUDED.completion_quizzes,
            completion_essays = EXCLUDED.completion_essays,
            reading_source = EXCLUDED.reading_source,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(params.course_id)
    .bind(params.required_readings)
    .bind(params.required_quizzes)
    .bind(params.required_videos)
    .bind(params.completion_quizzes)
    .bind(params.completion_essays)
    .bind(params.reading_source)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}
