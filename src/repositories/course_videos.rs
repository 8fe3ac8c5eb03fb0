use sqlx::PgPool;

use crate::db::models::CourseVideo;

const COLUMNS: &str = "\
    id, course_id, module_id, title, description, video_url, duration_seconds, \
    order_index, is_published, created_at";

pub(crate) struct CreateVideo<'a> {
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) video_url: &'a str,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) order_index: i32,
    pub(crate) is_published: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct VideoWithCourse {
    #[sqlx(flatten)]
    pub(crate) video: CourseVideo,
    pub(crate) course_name: String,
}

pub(crate) async fn create(pool: &PgPool, params: CreateVideo<'_>) -> Result<CourseVideo, sqlx::Error> {
    sqlx::query_as::<_, CourseVideo>(&format!(
        "INSERT INTO course_videos (
            course_id, module_id, title, description, video_url, duration_seconds,
            order_index, is_published, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.course_id)
    .bind(params.module_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.video_url)
    .bind(params.duration_seconds)
    .bind(params.order_index)
    .bind(params.is_published)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_published_for_course(
    pool: &PgPool,
    course_id: i32,
) -> Result<Vec<CourseVideo>, sqlx::Error> {
    sqlx::query_as::<_, CourseVideo>(&format!(
        "SELECT {COLUMNS} FROM course_videos
         WHERE course_id = $1 AND is_published = TRUE
         ORDER BY order_index, id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all_with_course(pool: &PgPool) -> Result<Vec<VideoWithCourse>, sqlx::Error> {
    sqlx::query_as::<_, VideoWithCourse>(
        "SELECT v.id, v.course_id, v.module_id, v.title, v.description, v.video_url,
                v.duration_seconds, v.order_index, v.is_published, v.created_at,
                c.name AS course_name
         FROM course_videos v
         JOIN courses c ON c.id = v.course_id
         ORDER BY v.course_id, v.order_index, v.id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_published_for_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM course_videos WHERE course_id = $1 AND is_published = TRUE",
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}
