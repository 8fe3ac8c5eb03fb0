use sqlx::PgPool;

use crate::db::models::{Quiz, QuizQuestion};
use crate::db::types::QuestionType;

const QUIZ_COLUMNS: &str = "\
    id, course_id, module_id, slug, title, description, time_limit_minutes, \
    passing_score, is_final_exam, is_published, created_at";

const QUESTION_COLUMNS: &str =
    "id, quiz_id, question, question_type, options, correct_answer, points, order_index";

pub(crate) struct CreateQuiz<'a> {
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) slug: Option<&'a str>,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) is_final_exam: bool,
    pub(crate) is_published: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) quiz_id: i32,
    pub(crate) question: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) options: serde_json::Value,
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuizWithCourse {
    #[sqlx(flatten)]
    pub(crate) quiz: Quiz,
    pub(crate) course_name: String,
    pub(crate) question_count: i64,
}

pub(crate) async fn create(pool: &PgPool, params: CreateQuiz<'_>) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            course_id, module_id, slug, title, description, time_limit_minutes,
            passing_score, is_final_exam, is_published, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
         RETURNING {QUIZ_COLUMNS}"
    ))
    .bind(params.course_id)
    .bind(params.module_id)
    .bind(params.slug)
    .bind(params.title)
    .bind(params.description)
    .bind(params.time_limit_minutes)
    .bind(params.passing_score)
    .bind(params.is_final_exam)
    .bind(params.is_published)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, quiz_id: i32) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(quiz_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE slug = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_published_for_course(
    pool: &PgPool,
    course_id: i32,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes
         WHERE course_id = $1 AND is_published = TRUE
         ORDER BY is_final_exam, id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_published(pool: &PgPool) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes
         WHERE is_published = TRUE
         ORDER BY course_id, is_final_exam, id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all_with_course(pool: &PgPool) -> Result<Vec<QuizWithCourse>, sqlx::Error> {
    sqlx::query_as::<_, QuizWithCourse>(
        "SELECT q.id, q.course_id, q.module_id, q.slug, q.title, q.description,
                q.time_limit_minutes, q.passing_score, q.is_final_exam, q.is_published,
                q.created_at,
                c.name AS course_name,
                (SELECT COUNT(*) FROM quiz_questions qq WHERE qq.quiz_id = q.id) AS question_count
         FROM quizzes q
         JOIN courses c ON c.id = q.course_id
         ORDER BY q.course_id, q.id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_published_for_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM quizzes
         WHERE course_id = $1 AND is_published = TRUE AND is_final_exam = FALSE",
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn create_question(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<QuizQuestion, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(&format!(
        "INSERT INTO quiz_questions (
            quiz_id, question, question_type, options, correct_answer, points, order_index
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(params.quiz_id)
    .bind(params.question)
    .bind(params.question_type)
    .bind(sqlx::types::Json(params.options))
    .bind(params.correct_answer)
    .bind(params.points)
    .bind(params.order_index)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    quiz_id: i32,
) -> Result<Vec<QuizQuestion>, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions
         WHERE quiz_id = $1
         ORDER BY order_index, id"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}
