use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::QuizAttempt;

const COLUMNS: &str = "\
    id, student_id, quiz_id, answers, score, started_at, completed_at, time_spent_seconds, \
    essay, essay_graded, instructor_feedback, final_grade, certificate_approved";

pub(crate) struct CreateQuizAttempt<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) quiz_id: i32,
    pub(crate) answers: serde_json::Value,
    pub(crate) score: f64,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) completed_at: PrimitiveDateTime,
    pub(crate) time_spent_seconds: Option<i32>,
    pub(crate) essay: Option<&'a str>,
}

/// Attempt joined with the quiz fields that completion rules depend on.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CourseAttemptRow {
    pub(crate) quiz_id: i32,
    pub(crate) is_final_exam: bool,
    pub(crate) passing_score: i32,
    pub(crate) score: f64,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) essay: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AttemptWithQuiz {
    #[sqlx(flatten)]
    pub(crate) attempt: QuizAttempt,
    pub(crate) quiz_title: String,
    pub(crate) course_id: i32,
    pub(crate) is_final_exam: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuizAttemptStats {
    pub(crate) quiz_id: i32,
    pub(crate) attempts: i64,
    pub(crate) best_score: Option<f64>,
}

pub(crate) struct GradeAttempt<'a> {
    pub(crate) essay_graded: bool,
    pub(crate) instructor_feedback: Option<&'a str>,
    pub(crate) final_grade: Option<f64>,
    pub(crate) certificate_approved: bool,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuizAttempt<'_>,
) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts (
            student_id, quiz_id, answers, score, started_at, completed_at,
            time_spent_seconds, essay
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(params.student_id)
    .bind(params.quiz_id)
    .bind(sqlx::types::Json(params.answers))
    .bind(params.score)
    .bind(params.started_at)
    .bind(params.completed_at)
    .bind(params.time_spent_seconds)
    .bind(params.essay)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    attempt_id: i32,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(attempt_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn latest_for_student_quiz(
    pool: &PgPool,
    student_id: &str,
    quiz_id: i32,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts
         WHERE student_id = $1 AND quiz_id = $2
         ORDER BY completed_at DESC NULLS LAST, id DESC
         LIMIT 1"
    ))
    .bind(student_id)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<AttemptWithQuiz>, sqlx::Error> {
    sqlx::query_as::<_, AttemptWithQuiz>(
        "SELECT a.id, a.student_id, a.quiz_id, a.answers, a.score, a.started_at, a.completed_at,
                a.time_spent_seconds, a.essay, a.essay_graded, a.instructor_feedback,
                a.final_grade, a.certificate_approved,
                q.title AS quiz_title, q.course_id, q.is_final_exam
         FROM quiz_attempts a
         JOIN quizzes q ON q.id = a.quiz_id
         WHERE a.student_id = $1
         ORDER BY a.completed_at DESC NULLS LAST, a.id DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn stats_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<QuizAttemptStats>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttemptStats>(
        "SELECT quiz_id, COUNT(*) AS attempts, MAX(score) AS best_score
         FROM quiz_attempts
         WHERE student_id = $1 AND completed_at IS NOT NULL
         GROUP BY quiz_id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

/// Completed attempts a student made on quizzes of one course.
pub(crate) async fn list_for_student_course(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: i32,
) -> Result<Vec<CourseAttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseAttemptRow>(
        "SELECT a.quiz_id, q.is_final_exam, q.passing_score, a.score, a.completed_at, a.essay
         FROM quiz_attempts a
         JOIN quizzes q ON q.id = a.quiz_id
         WHERE a.student_id = $1 AND q.course_id = $2 AND a.completed_at IS NOT NULL
         ORDER BY a.completed_at",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// Every completed score for the student, as fractions.
pub(crate) async fn scores_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT score FROM quiz_attempts
         WHERE student_id = $1 AND completed_at IS NOT NULL
         ORDER BY id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

/// Only the grading fields are writable after an attempt is scored.
pub(crate) async fn grade(
    pool: &PgPool,
    attempt_id: i32,
    params: GradeAttempt<'_>,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "UPDATE quiz_attempts
         SET essay_graded = $1,
             instructor_feedback = COALESCE($2, instructor_feedback),
             final_grade = COALESCE($3, final_grade),
             certificate_approved = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(params.essay_graded)
    .bind(params.instructor_feedback)
    .bind(params.final_grade)
    .bind(params.certificate_approved)
    .bind(attempt_id)
    .fetch_optional(pool)
    .await
}
