use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Certificate;

const COLUMNS: &str = "\
    id, certificate_number, student_id, course_id, student_name, course_title, \
    completion_date, final_grade, instructor_name, certificate_type, issued_at";

pub(crate) struct IssueCertificate<'a> {
    pub(crate) certificate_number: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) course_id: i32,
    pub(crate) student_name: &'a str,
    pub(crate) course_title: &'a str,
    pub(crate) completion_date: PrimitiveDateTime,
    pub(crate) final_grade: Option<f64>,
    pub(crate) instructor_name: Option<&'a str>,
    pub(crate) issued_at: PrimitiveDateTime,
}

/// Returns `None` when the student already holds a certificate for the course.
pub(crate) async fn issue_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    params: IssueCertificate<'_>,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "INSERT INTO certificates (
            certificate_number, student_id, course_id, student_name, course_title,
            completion_date, final_grade, instructor_name, certificate_type, issued_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,'completion',$9)
         ON CONFLICT (student_id, course_id) DO NOTHING
         RETURNING {COLUMNS}"
    ))
    .bind(params.certificate_number)
    .bind(params.student_id)
    .bind(params.course_id)
    .bind(params.student_name)
    .bind(params.course_title)
    .bind(params.completion_date)
    .bind(params.final_grade)
    .bind(params.instructor_name)
    .bind(params.issued_at)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn record_course_completion(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: i32,
    completed_at: PrimitiveDateTime,
    final_grade: Option<f64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO course_completions (student_id, course_id, completed_at, final_grade)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT (student_id, course_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(completed_at)
    .bind(final_grade)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE student_id = $1 ORDER BY issued_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_number(
    pool: &PgPool,
    certificate_number: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE certificate_number = $1"
    ))
    .bind(certificate_number)
    .fetch_optional(pool)
    .await
}
