//! Automatic scoring of quiz submissions.
//!
//! Only `multiple_choice` questions that carry a correct answer are scored.
//! True/false, fill-in-the-blank, yes/no and essay questions are left out of
//! both numerator and denominator. This is a known gap rather than a grading
//! policy, so the number of skipped questions is reported with every outcome.

use serde_json::{Map, Value};

use crate::db::models::QuizQuestion;
use crate::db::types::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoreOutcome {
    pub(crate) correct: usize,
    pub(crate) scored_questions: usize,
    pub(crate) unscored_questions: usize,
    /// Fraction in `[0, 1]`; `0.0` when nothing was scorable.
    pub(crate) score: f64,
}

pub(crate) fn is_auto_scored(question: &QuizQuestion) -> bool {
    question.question_type == QuestionType::MultipleChoice && question.correct_answer.is_some()
}

/// Answers are keyed by question id. A missing or non-string answer counts
/// as wrong.
pub(crate) fn score_answers(questions: &[QuizQuestion], answers: &Map<String, Value>) -> ScoreOutcome {
    let mut correct = 0usize;
    let mut scored_questions = 0usize;

    for question in questions.iter().filter(|question| is_auto_scored(question)) {
        scored_questions += 1;
        let submitted = answers.get(&question.id.to_string()).and_then(Value::as_str);
        if submitted.is_some() && submitted == question.correct_answer.as_deref() {
            correct += 1;
        }
    }

    let score = if scored_questions == 0 { 0.0 } else { correct as f64 / scored_questions as f64 };

    ScoreOutcome {
        correct,
        scored_questions,
        unscored_questions: questions.len() - scored_questions,
        score,
    }
}

/// Fractional score as a percentage rounded to two decimals.
pub(crate) fn score_percent(score: f64) -> f64 {
    (score * 10_000.0).round() / 100.0
}

/// `passing_score` is a whole percent stored on the quiz.
pub(crate) fn is_passing(score: f64, passing_score: i32) -> bool {
    score_percent(score) >= f64::from(passing_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::types::Json;

    fn question(id: i32, question_type: QuestionType, correct: Option<&str>) -> QuizQuestion {
        QuizQuestion {
            id,
            quiz_id: 1,
            question: format!("Question {id}"),
            question_type,
            options: Json(json!(["A", "B", "C", "D"])),
            correct_answer: correct.map(str::to_string),
            points: 1,
            order_index: id,
        }
    }

    fn answers(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("answers object")
    }

    #[test]
    fn half_right_scores_one_half() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, Some("A")),
            question(2, QuestionType::MultipleChoice, Some("C")),
        ];
        let outcome = score_answers(&questions, &answers(json!({"1": "A", "2": "B"})));
        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.scored_questions, 2);
        assert_eq!(outcome.score, 0.5);
    }

    #[test]
    fn answers_must_match_the_key_exactly() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, Some("Grace")),
            question(2, QuestionType::MultipleChoice, Some("Faith")),
            question(3, QuestionType::MultipleChoice, Some("Hope")),
        ];
        let outcome =
            score_answers(&questions, &answers(json!({"1": "grace", "2": " Faith", "3": "Hope"})));
        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.scored_questions, 3);
    }

    #[test]
    fn all_correct_scores_one_and_none_correct_scores_zero() {
        let questions: Vec<_> = (1..=4)
            .map(|id| question(id, QuestionType::MultipleChoice, Some("B")))
            .collect();
        let all = score_answers(&questions, &answers(json!({"1": "B", "2": "B", "3": "B", "4": "B"})));
        assert_eq!(all.score, 1.0);
        let none = score_answers(&questions, &answers(json!({"1": "A", "2": "C", "3": "D", "4": "A"})));
        assert_eq!(none.score, 0.0);
    }

    #[test]
    fn other_question_types_never_affect_the_score() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, Some("A")),
            question(2, QuestionType::TrueFalse, Some("true")),
            question(3, QuestionType::FillBlank, Some("grace")),
            question(4, QuestionType::Essay, None),
            question(5, QuestionType::YesNoWithText, Some("yes")),
        ];
        let wrong_extras =
            score_answers(&questions, &answers(json!({"1": "A", "2": "false", "3": "law"})));
        let right_extras =
            score_answers(&questions, &answers(json!({"1": "A", "2": "true", "3": "grace"})));

        assert_eq!(wrong_extras.score, 1.0);
        assert_eq!(right_extras.score, 1.0);
        assert_eq!(wrong_extras.scored_questions, 1);
        assert_eq!(wrong_extras.unscored_questions, 4);
    }

    #[test]
    fn multiple_choice_without_answer_key_is_unscored() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, None),
            question(2, QuestionType::MultipleChoice, Some("D")),
        ];
        let outcome = score_answers(&questions, &answers(json!({"1": "A", "2": "D"})));
        assert_eq!(outcome.scored_questions, 1);
        assert_eq!(outcome.unscored_questions, 1);
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn no_scorable_questions_scores_zero() {
        let questions = vec![question(1, QuestionType::Essay, None)];
        let outcome = score_answers(&questions, &answers(json!({"1": "a long reflection"})));
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.scored_questions, 0);
        assert_eq!(score_answers(&[], &Map::new()).score, 0.0);
    }

    #[test]
    fn non_string_and_missing_answers_are_wrong() {
        let questions = vec![
            question(1, QuestionType::MultipleChoice, Some("1")),
            question(2, QuestionType::MultipleChoice, Some("B")),
        ];
        let outcome = score_answers(&questions, &answers(json!({"1": 1})));
        assert_eq!(outcome.correct, 0);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn passing_compares_percent_against_quiz_threshold() {
        assert!(is_passing(0.7, 70));
        assert!(!is_passing(0.6999, 70));
        assert!(is_passing(1.0, 100));
        assert!(is_passing(0.0, 0));
        assert_eq!(score_percent(2.0 / 3.0), 66.67);
    }
}
