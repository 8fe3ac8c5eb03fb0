pub(crate) mod models;
pub(crate) mod types;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use crate::core::config::Settings;

pub(crate) async fn init_pool(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    let database_url = settings.database().database_url();
    let mut connect_options: PgConnectOptions = database_url.parse()?;

    connect_options = connect_options
        .application_name("ministry-lms")
        .log_statements(tracing::log::LevelFilter::Off);

    PgPoolOptions::new()
        .max_connections(settings.database().max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres SQLSTATE 23505.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use crate::core::time::primitive_now_utc;
    use crate::db::types::ReadingSource;
    use crate::repositories::{course_requirements, courses};
    use crate::test_support;

    #[tokio::test]
    #[ignore = "requires Postgres"]
    async fn fresh_migration_seeds_founding_catalogue() {
        let (_guard, pool) = test_support::fresh_migrated_pool().await;

        let course_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM courses").fetch_one(&pool).await.unwrap();
        assert_eq!(course_count, 8);
        let requirement_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_requirements")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(requirement_count, 8);

        let acts = course_requirements::find_for_course(&pool, 1).await.unwrap().unwrap();
        assert_eq!(
            (acts.required_readings, acts.required_quizzes, acts.required_videos),
            (21, 11, 10)
        );
        assert_eq!((acts.completion_quizzes, acts.completion_essays), (4, 1));
        assert_eq!(acts.reading_source, ReadingSource::Content);

        let grow = course_requirements::find_for_course(&pool, 4).await.unwrap().unwrap();
        assert_eq!((grow.required_readings, grow.required_quizzes, grow.required_videos), (4, 5, 0));
    }

    #[tokio::test]
    #[ignore = "requires Postgres"]
    async fn courses_created_after_seeding_get_the_next_id() {
        let (_guard, pool) = test_support::fresh_migrated_pool().await;

        let course = courses::create(
            &pool,
            courses::CreateCourse {
                name: "Prayer Foundations",
                description: None,
                duration_weeks: 6,
                instructor_id: None,
                is_active: true,
                category: None,
                difficulty: None,
                points: 0,
                created_at: primitive_now_utc(),
            },
        )
        .await
        .unwrap();

        assert_eq!(course.id, 9);
        assert!(course_requirements::find_for_course(&pool, course.id).await.unwrap().is_none());
    }
}
