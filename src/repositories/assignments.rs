use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Assignment, AssignmentSubmission};

const ASSIGNMENT_COLUMNS: &str =
    "id, course_id, module_id, title, description, due_date, max_points, created_at";

const SUBMISSION_COLUMNS: &str =
    "id, assignment_id, student_id, content, submitted_at, grade, feedback";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) due_date: Option<PrimitiveDateTime>,
    pub(crate) max_points: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            course_id, module_id, title, description, due_date, max_points, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {ASSIGNMENT_COLUMNS}"
    ))
    .bind(params.course_id)
    .bind(params.module_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.due_date)
    .bind(params.max_points)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    assignment_id: i32,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
    ))
    .bind(assignment_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: i32,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
         WHERE course_id = $1
         ORDER BY due_date NULLS LAST, id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Resubmitting replaces the earlier text and clears any previous grade.
pub(crate) async fn submit(
    pool: &PgPool,
    assignment_id: i32,
    student_id: &str,
    content: &str,
    submitted_at: PrimitiveDateTime,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "INSERT INTO assignment_submissions (assignment_id, student_id, content, submitted_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT (assignment_id, student_id) DO UPDATE SET
            content = EXCLUDED.content,
            submitted_at = EXCLUDED.submitted_at,
            grade = NULL,
            feedback = NULL
         RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(assignment_id)
    .bind(student_id)
    .bind(content)
    .bind(submitted_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_submissions_for_student_course(
    pool: &PgPool,
    student_id: &str,
    course_id: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM assignment_submissions s
         JOIN assignments a ON a.id = s.assignment_id
         WHERE s.student_id = $1 AND a.course_id = $2",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}
