use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;

const COLUMNS: &str = "id, student_id, course_id, status, grade, enrolled_at, completed_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EnrollmentWithCourse {
    #[sqlx(flatten)]
    pub(crate) enrollment: Enrollment,
    pub(crate) course_name: String,
    pub(crate) course_description: Option<String>,
    pub(crate) duration_weeks: i32,
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: i32,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 AND course_id = $2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    enrollment_id: i32,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1"))
        .bind(enrollment_id)
        .fetch_optional(pool)
        .await
}

/// Inserts an active enrollment, or reactivates a dropped one. Returns
/// `None` when the student already holds an active or completed enrollment.
pub(crate) async fn enroll(
    pool: &PgPool,
    student_id: &str,
    course_id: i32,
    enrolled_at: PrimitiveDateTime,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (student_id, course_id, status, enrolled_at)
         VALUES ($1, $2, 'active', $3)
         ON CONFLICT (student_id, course_id) DO UPDATE SET
            status = 'active',
            enrolled_at = EXCLUDED.enrolled_at,
            completed_at = NULL,
            grade = NULL
         WHERE enrollments.status = 'dropped'
         RETURNING {COLUMNS}"
    ))
    .bind(student_id)
    .bind(course_id)
    .bind(enrolled_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<EnrollmentWithCourse>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentWithCourse>(
        "SELECT e.id, e.student_id, e.course_id, e.status, e.grade, e.enrolled_at, e.completed_at,
                c.name AS course_name, c.description AS course_description, c.duration_weeks
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         WHERE e.student_id = $1
         ORDER BY e.enrolled_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE status = 'active' ORDER BY id"
    ))
    .fetch_all(pool)
    .await
}

/// Moves an `active` enrollment to a terminal state. Returns `None` if the
/// enrollment was not active any more, which makes the transition race-safe.
pub(crate) async fn finish(
    executor: impl sqlx::PgExecutor<'_>,
    enrollment_id: i32,
    status: EnrollmentStatus,
    grade: Option<f64>,
    completed_at: Option<PrimitiveDateTime>,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments
         SET status = $1,
             grade = COALESCE($2, grade),
             completed_at = $3
         WHERE id = $4 AND status = 'active'
         RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(grade)
    .bind(completed_at)
    .bind(enrollment_id)
    .fetch_optional(executor)
    .await
}

/// Removes the enrollment together with everything the student produced in
/// the course. Runs in one transaction so no orphaned rows survive a failure.
pub(crate) async fn unenroll(
    pool: &PgPool,
    student_id: &str,
    course_id: i32,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let enrollment_id = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM enrollments WHERE student_id = $1 AND course_id = $2 FOR UPDATE",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(enrollment_id) = enrollment_id else {
        return Ok(false);
    };

    sqlx::query(
        "DELETE FROM quiz_attempts
         WHERE student_id = $1
           AND quiz_id IN (SELECT id FROM quizzes WHERE course_id = $2)",
    )
    .bind(student_id)
    .bind(course_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM content_progress WHERE student_id = $1 AND course_id = $2")
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM reading_progress WHERE user_id = $1 AND course_id = $2")
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM assignment_submissions
         WHERE student_id = $1
           AND assignment_id IN (SELECT id FROM assignments WHERE course_id = $2)",
    )
    .bind(student_id)
    .bind(course_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM enrollments WHERE id = $1")
        .bind(enrollment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}
