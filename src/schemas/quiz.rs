use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Quiz, QuizAttempt, QuizQuestion};
use crate::db::types::QuestionType;
use crate::repositories::quiz_attempts::{AttemptWithQuiz, QuizAttemptStats};

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: i32,
    pub(crate) course_id: i32,
    pub(crate) module_id: Option<i32>,
    pub(crate) slug: Option<String>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score: i32,
    pub(crate) is_final_exam: bool,
    pub(crate) is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) question_count: Option<i64>,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id,
            module_id: quiz.module_id,
            slug: quiz.slug,
            title: quiz.title,
            description: quiz.description,
            time_limit_minutes: quiz.time_limit_minutes,
            passing_score: quiz.passing_score,
            is_final_exam: quiz.is_final_exam,
            is_published: quiz.is_published,
            course_name: None,
            question_count: None,
        }
    }
}

/// A quiz as listed to a student, with their own attempt history.
#[derive(Debug, Serialize)]
pub(crate) struct StudentQuizResponse {
    #[serde(flatten)]
    pub(crate) quiz: QuizResponse,
    pub(crate) completed: bool,
    pub(crate) best_score: Option<f64>,
    pub(crate) attempts: i64,
}

impl StudentQuizResponse {
    pub(crate) fn build(quiz: Quiz, stats: &HashMap<i32, QuizAttemptStats>) -> Self {
        let own = stats.get(&quiz.id);
        Self {
            quiz: QuizResponse::from_db(quiz),
            completed: own.is_some_and(|row| row.attempts > 0),
            best_score: own.and_then(|row| row.best_score),
            attempts: own.map_or(0, |row| row.attempts),
        }
    }
}

/// Question as shown while taking a quiz; never carries the answer key.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: i32,
    pub(crate) question: String,
    pub(crate) question_type: QuestionType,
    pub(crate) options: serde_json::Value,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: QuizQuestion) -> Self {
        Self {
            id: question.id,
            question: question.question,
            question_type: question.question_type,
            options: question.options.0,
            points: question.points,
            order_index: question.order_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizDetailResponse {
    #[serde(flatten)]
    pub(crate) quiz: QuizResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewQuestionResponse {
    #[serde(flatten)]
    pub(crate) question: QuestionResponse,
    pub(crate) correct_answer: Option<String>,
    pub(crate) student_answer: Option<serde_json::Value>,
    /// `None` for questions that are not auto-scored.
    pub(crate) is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizReviewResponse {
    pub(crate) quiz: QuizResponse,
    pub(crate) attempt: AttemptResponse,
    pub(crate) questions: Vec<ReviewQuestionResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptSubmit {
    #[serde(default)]
    #[serde(alias = "quizId")]
    pub(crate) quiz_id: Option<i32>,
    #[serde(default)]
    pub(crate) answers: serde_json::Map<String, serde_json::Value>,
    /// Seconds spent on the attempt.
    #[serde(default)]
    #[serde(alias = "timeSpent")]
    #[validate(range(min = 0, message = "time_spent must be non-negative"))]
    pub(crate) time_spent: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 20000, message = "essay is too long"))]
    pub(crate) essay: Option<String>,
    #[serde(default)]
    #[serde(alias = "studentId")]
    pub(crate) student_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: i32,
    pub(crate) student_id: String,
    pub(crate) quiz_id: i32,
    pub(crate) answers: serde_json::Value,
    pub(crate) score: f64,
    pub(crate) percentage: f64,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) time_spent_seconds: Option<i32>,
    pub(crate) essay: Option<String>,
    pub(crate) essay_graded: bool,
    pub(crate) instructor_feedback: Option<String>,
    pub(crate) final_grade: Option<f64>,
    pub(crate) certificate_approved: bool,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            student_id: attempt.student_id,
            quiz_id: attempt.quiz_id,
            answers: attempt.answers.0,
            score: attempt.score,
            percentage: crate::services::quiz_scoring::score_percent(attempt.score),
            started_at: format_primitive(attempt.started_at),
            completed_at: attempt.completed_at.map(format_primitive),
            time_spent_seconds: attempt.time_spent_seconds,
            essay: attempt.essay,
            essay_graded: attempt.essay_graded,
            instructor_feedback: attempt.instructor_feedback,
            final_grade: attempt.final_grade,
            certificate_approved: attempt.certificate_approved,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptWithQuizResponse {
    #[serde(flatten)]
    pub(crate) attempt: AttemptResponse,
    pub(crate) quiz_title: String,
    pub(crate) course_id: i32,
    pub(crate) is_final_exam: bool,
}

impl AttemptWithQuizResponse {
    pub(crate) fn from_db(row: AttemptWithQuiz) -> Self {
        Self {
            attempt: AttemptResponse::from_db(row.attempt),
            quiz_title: row.quiz_title,
            course_id: row.course_id,
            is_final_exam: row.is_final_exam,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResultResponse {
    pub(crate) success: bool,
    pub(crate) attempt: AttemptResponse,
    pub(crate) correct: usize,
    pub(crate) scored_questions: usize,
    pub(crate) unscored_questions: usize,
    pub(crate) passed: bool,
    pub(crate) course_completed: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptGradeRequest {
    #[serde(default = "default_true")]
    #[serde(alias = "essayGraded")]
    pub(crate) essay_graded: bool,
    #[serde(default)]
    #[serde(alias = "instructorFeedback")]
    pub(crate) instructor_feedback: Option<String>,
    #[serde(default)]
    #[serde(alias = "finalGrade")]
    #[validate(range(min = 0.0, max = 100.0, message = "final_grade must be between 0 and 100"))]
    pub(crate) final_grade: Option<f64>,
    #[serde(default)]
    #[serde(alias = "certificateApproved")]
    pub(crate) certificate_approved: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[serde(default)]
    #[serde(alias = "moduleId")]
    pub(crate) module_id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "slug must be 1-120 characters"))]
    pub(crate) slug: Option<String>,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "timeLimitMinutes")]
    #[validate(range(min = 1, message = "time_limit_minutes must be positive"))]
    pub(crate) time_limit_minutes: Option<i32>,
    /// Whole percent; falls back to the configured default.
    #[serde(default)]
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0, max = 100, message = "passing_score must be between 0 and 100"))]
    pub(crate) passing_score: Option<i32>,
    #[serde(default)]
    #[serde(alias = "isFinalExam")]
    pub(crate) is_final_exam: bool,
    #[serde(default = "default_true")]
    #[serde(alias = "isPublished")]
    pub(crate) is_published: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub(crate) question: String,
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[serde(default)]
    pub(crate) options: serde_json::Value,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
    #[serde(default = "default_points")]
    #[validate(range(min = 0, message = "points must be non-negative"))]
    pub(crate) points: i32,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    pub(crate) order_index: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionAdminResponse {
    #[serde(flatten)]
    pub(crate) question: QuestionResponse,
    pub(crate) correct_answer: Option<String>,
}

impl QuestionAdminResponse {
    pub(crate) fn from_db(question: QuizQuestion) -> Self {
        let correct_answer = question.correct_answer.clone();
        Self {
            question: QuestionResponse::from_db(question),
            correct_answer,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_points() -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::types::Json;

    #[test]
    fn question_response_hides_answer_key() {
        let question = QuizQuestion {
            id: 3,
            quiz_id: 1,
            question: "Who wrote Romans?".to_string(),
            question_type: QuestionType::MultipleChoice,
            options: Json(json!(["Paul", "Peter"])),
            correct_answer: Some("Paul".to_string()),
            points: 1,
            order_index: 0,
        };
        let body = serde_json::to_value(QuestionResponse::from_db(question)).unwrap();
        assert!(body.get("correct_answer").is_none());
        assert_eq!(body["question_type"], "multiple_choice");
    }

    #[test]
    fn attempt_submit_accepts_camel_case() {
        let payload: AttemptSubmit = serde_json::from_value(json!({
            "quizId": 4,
            "answers": {"10": "A"},
            "timeSpent": 120,
            "studentId": "abc"
        }))
        .unwrap();
        assert_eq!(payload.quiz_id, Some(4));
        assert_eq!(payload.time_spent, Some(120));
        assert_eq!(payload.student_id.as_deref(), Some("abc"));
        assert_eq!(payload.answers.get("10"), Some(&json!("A")));
    }

    #[test]
    fn student_quiz_without_attempts_is_not_completed() {
        let quiz = Quiz {
            id: 7,
            course_id: 1,
            module_id: None,
            slug: Some("week-1".to_string()),
            title: "Week 1".to_string(),
            description: None,
            time_limit_minutes: None,
            passing_score: 70,
            is_final_exam: false,
            is_published: true,
            created_at: time::macros::datetime!(2025-01-01 00:00:00),
        };
        let response = StudentQuizResponse::build(quiz, &HashMap::new());
        assert!(!response.completed);
        assert_eq!(response.attempts, 0);
        assert_eq!(response.best_score, None);
    }
}
