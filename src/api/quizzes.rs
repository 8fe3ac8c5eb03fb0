use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use time::Duration;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_grader, CurrentIdentity, CurrentUser};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Quiz;
use crate::repositories;
use crate::schemas::quiz::{
    AttemptGradeRequest, AttemptResponse, AttemptResultResponse, AttemptSubmit,
    AttemptWithQuizResponse, QuestionResponse, QuizDetailResponse, QuizResponse,
    QuizReviewResponse, ReviewQuestionResponse, StudentQuizResponse,
};
use crate::services::enrollment_completion::{self, CompletionOutcome};
use crate::services::quiz_scoring;

/// Routes span `/quizzes`, `/quiz-attempts` and `/student/quizzes`, so this
/// router is merged at the API root instead of nested.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/quizzes/:quiz_ref", get(get_quiz))
        .route("/quizzes/:quiz_ref/attempt", post(submit_for_quiz))
        .route("/quiz-attempts", post(submit_attempt))
        .route("/quiz-attempts/student", get(list_student_attempts))
        .route("/quiz-attempts/:id/review", get(review_latest_attempt))
        .route("/quiz-attempts/:id/grade", patch(grade_attempt))
        .route("/student/quizzes/all", get(list_student_quizzes))
}

async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_ref): Path<String>,
) -> Result<Json<QuizDetailResponse>, ApiError> {
    let quiz = resolve_quiz(&state, &quiz_ref).await?;
    let questions = repositories::quizzes::list_questions(state.db(), quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz questions"))?;

    Ok(Json(QuizDetailResponse {
        quiz: QuizResponse::from_db(quiz),
        questions: questions.into_iter().map(QuestionResponse::from_db).collect(),
    }))
}

async fn submit_for_quiz(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Path(quiz_ref): Path<String>,
    Json(payload): Json<AttemptSubmit>,
) -> Result<(StatusCode, Json<AttemptResultResponse>), ApiError> {
    payload.validate()?;
    let quiz = resolve_quiz(&state, &quiz_ref).await?;
    let student_id = attempt_student_id(identity.user().map(|user| user.id.as_str()), &payload)?;
    record_attempt(&state, quiz, &student_id, payload).await
}

async fn submit_attempt(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Json(payload): Json<AttemptSubmit>,
) -> Result<(StatusCode, Json<AttemptResultResponse>), ApiError> {
    payload.validate()?;
    let quiz_id =
        payload.quiz_id.ok_or_else(|| ApiError::BadRequest("Quiz ID is required".to_string()))?;
    let quiz = fetch_quiz(&state, quiz_id).await?;
    let student_id = attempt_student_id(identity.user().map(|user| user.id.as_str()), &payload)?;
    record_attempt(&state, quiz, &student_id, payload).await
}

async fn list_student_attempts(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttemptWithQuizResponse>>, ApiError> {
    let attempts = repositories::quiz_attempts::list_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quiz attempts"))?;

    Ok(Json(attempts.into_iter().map(AttemptWithQuizResponse::from_db).collect()))
}

async fn review_latest_attempt(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<i32>,
) -> Result<Json<QuizReviewResponse>, ApiError> {
    let quiz = fetch_quiz(&state, quiz_id).await?;

    let attempt =
        repositories::quiz_attempts::latest_for_student_quiz(state.db(), &user.id, quiz.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load quiz attempt"))?
            .ok_or_else(|| ApiError::not_found("Quiz attempt"))?;

    let questions = repositories::quizzes::list_questions(state.db(), quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz questions"))?;

    let answers = attempt.answers.0.as_object().cloned().unwrap_or_default();
    let questions = questions
        .into_iter()
        .map(|question| {
            let student_answer = answers.get(&question.id.to_string()).cloned();
            let is_correct = quiz_scoring::is_auto_scored(&question).then(|| {
                student_answer.as_ref().and_then(|answer| answer.as_str())
                    == question.correct_answer.as_deref()
            });
            ReviewQuestionResponse {
                correct_answer: question.correct_answer.clone(),
                student_answer,
                is_correct,
                question: QuestionResponse::from_db(question),
            }
        })
        .collect();

    Ok(Json(QuizReviewResponse {
        quiz: QuizResponse::from_db(quiz),
        attempt: AttemptResponse::from_db(attempt),
        questions,
    }))
}

async fn grade_attempt(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(attempt_id): Path<i32>,
    Json(payload): Json<AttemptGradeRequest>,
) -> Result<Json<AttemptResponse>, ApiError> {
    payload.validate()?;

    let attempt = repositories::quiz_attempts::find_by_id(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz attempt"))?
        .ok_or_else(|| ApiError::not_found("Quiz attempt"))?;
    let quiz = fetch_quiz(&state, attempt.quiz_id).await?;

    require_course_grader(&state, &user, quiz.course_id).await?;

    let graded = repositories::quiz_attempts::grade(
        state.db(),
        attempt.id,
        repositories::quiz_attempts::GradeAttempt {
            essay_graded: payload.essay_graded,
            instructor_feedback: payload.instructor_feedback.as_deref(),
            final_grade: payload.final_grade,
            certificate_approved: payload.certificate_approved,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to grade quiz attempt"))?
    .ok_or_else(|| ApiError::not_found("Quiz attempt"))?;

    tracing::info!(
        user_id = %user.id,
        attempt_id,
        course_id = quiz.course_id,
        certificate_approved = graded.certificate_approved,
        action = "grade_attempt",
        "Quiz attempt graded"
    );

    if graded.certificate_approved {
        enrollment_completion::check_enrollment(
            state.db(),
            state.settings().progress(),
            &graded.student_id,
            quiz.course_id,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to evaluate course completion"))?;
    }

    Ok(Json(AttemptResponse::from_db(graded)))
}

async fn list_student_quizzes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentQuizResponse>>, ApiError> {
    let quizzes = repositories::quizzes::list_published(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;
    let stats: HashMap<_, _> = repositories::quiz_attempts::stats_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz attempt stats"))?
        .into_iter()
        .map(|row| (row.quiz_id, row))
        .collect();

    Ok(Json(quizzes.into_iter().map(|quiz| StudentQuizResponse::build(quiz, &stats)).collect()))
}

/// Signed-in callers always submit as themselves; guests must name a student.
fn attempt_student_id(user_id: Option<&str>, payload: &AttemptSubmit) -> Result<String, ApiError> {
    if let Some(user_id) = user_id {
        return Ok(user_id.to_string());
    }

    payload
        .student_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("Student ID is required".to_string()))
}

async fn record_attempt(
    state: &AppState,
    quiz: Quiz,
    student_id: &str,
    payload: AttemptSubmit,
) -> Result<(StatusCode, Json<AttemptResultResponse>), ApiError> {
    let student = repositories::users::find_by_id(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?;
    if student.is_none() {
        return Err(ApiError::not_found("Student"));
    }

    let questions = repositories::quizzes::list_questions(state.db(), quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz questions"))?;
    let outcome = quiz_scoring::score_answers(&questions, &payload.answers);

    if outcome.unscored_questions > 0 {
        tracing::debug!(
            quiz_id = quiz.id,
            unscored = outcome.unscored_questions,
            scored = outcome.scored_questions,
            "Quiz contains questions without automatic scoring"
        );
    }

    let completed_at = primitive_now_utc();
    let started_at =
        completed_at - Duration::seconds(i64::from(payload.time_spent.unwrap_or(0).max(0)));
    let essay = payload.essay.as_deref().map(str::trim).filter(|essay| !essay.is_empty());

    let attempt = repositories::quiz_attempts::create(
        state.db(),
        repositories::quiz_attempts::CreateQuizAttempt {
            student_id,
            quiz_id: quiz.id,
            answers: serde_json::Value::Object(payload.answers),
            score: outcome.score,
            started_at,
            completed_at,
            time_spent_seconds: payload.time_spent,
            essay,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store quiz attempt"))?;

    let passed = quiz_scoring::is_passing(outcome.score, quiz.passing_score);
    metrics::record_quiz_attempt(passed, outcome.unscored_questions);
    tracing::info!(
        user_id = %student_id,
        quiz_id = quiz.id,
        course_id = quiz.course_id,
        score = outcome.score,
        passed,
        action = "quiz_attempt",
        "Quiz attempt recorded"
    );

    let completion = enrollment_completion::check_enrollment(
        state.db(),
        state.settings().progress(),
        student_id,
        quiz.course_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to evaluate course completion"))?;

    Ok((
        StatusCode::CREATED,
        Json(AttemptResultResponse {
            success: true,
            attempt: AttemptResponse::from_db(attempt),
            correct: outcome.correct,
            scored_questions: outcome.scored_questions,
            unscored_questions: outcome.unscored_questions,
            passed,
            course_completed: matches!(completion, CompletionOutcome::Completed { .. }),
        }),
    ))
}

/// Numeric references are ids; anything else is looked up as a slug.
async fn resolve_quiz(state: &AppState, quiz_ref: &str) -> Result<Quiz, ApiError> {
    let found = match quiz_ref.parse::<i32>() {
        Ok(quiz_id) => repositories::quizzes::find_by_id(state.db(), quiz_id).await,
        Err(_) => repositories::quizzes::find_by_slug(state.db(), quiz_ref).await,
    };

    found
        .map_err(|e| ApiError::internal(e, "Failed to load quiz"))?
        .ok_or_else(|| ApiError::not_found("Quiz"))
}

async fn fetch_quiz(state: &AppState, quiz_id: i32) -> Result<Quiz, ApiError> {
    repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz"))?
        .ok_or_else(|| ApiError::not_found("Quiz"))
}

#[cfg(test)]
mod tests;
