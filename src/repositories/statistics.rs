use sqlx::PgPool;
use time::PrimitiveDateTime;

/// Per-student aggregates consumed by the dean dashboards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct StudentSummaryRow {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) gender: Option<String>,
    pub(crate) is_blocked: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) enrolled_count: i64,
    pub(crate) completed_count: i64,
    pub(crate) attempt_count: i64,
    /// Mean attempt score as a fraction, `None` without attempts.
    pub(crate) average_score: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PlatformTotals {
    pub(crate) total_users: i64,
    pub(crate) total_students: i64,
    pub(crate) total_instructors: i64,
    pub(crate) total_courses: i64,
    pub(crate) active_courses: i64,
    pub(crate) total_enrollments: i64,
    pub(crate) active_enrollments: i64,
    pub(crate) completed_enrollments: i64,
    pub(crate) total_quiz_attempts: i64,
    pub(crate) certificates_issued: i64,
    pub(crate) average_score: Option<f64>,
}

pub(crate) async fn student_summaries(
    pool: &PgPool,
) -> Result<Vec<StudentSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentSummaryRow>(
        "SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.gender,
                u.is_blocked, u.created_at,
                COALESCE(e.enrolled_count, 0) AS enrolled_count,
                COALESCE(e.completed_count, 0) AS completed_count,
                COALESCE(a.attempt_count, 0) AS attempt_count,
                a.average_score
         FROM users u
         LEFT JOIN (
            SELECT student_id,
                   COUNT(*) AS enrolled_count,
                   COUNT(*) FILTER (WHERE status = 'completed') AS completed_count
            FROM enrollments
            GROUP BY student_id
         ) e ON e.student_id = u.id
         LEFT JOIN (
            SELECT student_id, COUNT(*) AS attempt_count, AVG(score) AS average_score
            FROM quiz_attempts
            WHERE completed_at IS NOT NULL
            GROUP BY student_id
         ) a ON a.student_id = u.id
         WHERE u.role = 'student'
         ORDER BY u.created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_students_since(
    pool: &PgPool,
    since: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = 'student' AND created_at >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await
}

/// Students grouped by the free-text gender field, normalised to lowercase.
pub(crate) async fn gender_counts(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT COALESCE(NULLIF(lower(trim(gender)), ''), 'unspecified') AS gender, COUNT(*)
         FROM users
         WHERE role = 'student'
         GROUP BY 1
         ORDER BY 1",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn platform_totals(pool: &PgPool) -> Result<PlatformTotals, sqlx::Error> {
    sqlx::query_as::<_, PlatformTotals>(
        "SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE role = 'student') AS total_students,
            (SELECT COUNT(*) FROM users WHERE role = 'instructor') AS total_instructors,
            (SELECT COUNT(*) FROM courses) AS total_courses,
            (SELECT COUNT(*) FROM courses WHERE is_active = TRUE) AS active_courses,
            (SELECT COUNT(*) FROM enrollments) AS total_enrollments,
            (SELECT COUNT(*) FROM enrollments WHERE status = 'active') AS active_enrollments,
            (SELECT COUNT(*) FROM enrollments WHERE status = 'completed') AS completed_enrollments,
            (SELECT COUNT(*) FROM quiz_attempts) AS total_quiz_attempts,
            (SELECT COUNT(*) FROM certificates) AS certificates_issued,
            (SELECT AVG(score) FROM quiz_attempts WHERE completed_at IS NOT NULL) AS average_score",
    )
    .fetch_one(pool)
    .await
}
