//! Automatic course completion.
//!
//! An active enrollment completes once the student has attempted enough
//! distinct regular quizzes and written enough substantial final-exam
//! essays. Completion moves the enrollment, records the completion and
//! issues the certificate in one transaction.

use std::collections::HashSet;

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::core::config::ProgressSettings;
use crate::core::metrics;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Certificate, Enrollment};
use crate::db::types::EnrollmentStatus;
use crate::repositories::quiz_attempts::CourseAttemptRow;
use crate::repositories::{enrollments, quiz_attempts};
use crate::services::{certificates, progress};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CompletionDecision {
    Pending {
        regular_quizzes: i64,
        required_quizzes: i64,
        essays: i64,
        required_essays: i64,
    },
    Ready {
        grade: Option<f64>,
        completed_at: Option<PrimitiveDateTime>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CompletionOutcome {
    NotEnrolled,
    AlreadyFinal(EnrollmentStatus),
    Pending {
        regular_quizzes: i64,
        required_quizzes: i64,
        essays: i64,
        required_essays: i64,
    },
    Completed {
        grade: Option<f64>,
        certificate_number: Option<String>,
    },
}

impl CompletionOutcome {
    pub(crate) fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub(crate) struct CompletionSweep {
    pub(crate) checked: usize,
    pub(crate) completed: usize,
}

fn is_substantial_essay(essay: Option<&str>, min_chars: usize) -> bool {
    essay.is_some_and(|text| text.trim().chars().count() > min_chars)
}

pub(crate) fn evaluate(
    attempts: &[CourseAttemptRow],
    completion_quizzes: i64,
    completion_essays: i64,
    min_essay_chars: usize,
) -> CompletionDecision {
    let regular_quizzes = attempts
        .iter()
        .filter(|attempt| !attempt.is_final_exam)
        .map(|attempt| attempt.quiz_id)
        .collect::<HashSet<_>>()
        .len() as i64;

    let essays = attempts
        .iter()
        .filter(|attempt| attempt.is_final_exam)
        .filter(|attempt| is_substantial_essay(attempt.essay.as_deref(), min_essay_chars))
        .count() as i64;

    if regular_quizzes < completion_quizzes || essays < completion_essays {
        return CompletionDecision::Pending {
            regular_quizzes,
            required_quizzes: completion_quizzes,
            essays,
            required_essays: completion_essays,
        };
    }

    let scores: Vec<f64> = attempts.iter().map(|attempt| attempt.score).collect();
    CompletionDecision::Ready {
        grade: progress::average_percent(&scores).map(progress::enrollment_grade),
        completed_at: attempts.iter().filter_map(|attempt| attempt.completed_at).max(),
    }
}

/// Re-evaluates one student's enrollment in a course.
pub(crate) async fn check_enrollment(
    pool: &PgPool,
    settings: &ProgressSettings,
    student_id: &str,
    course_id: i32,
) -> Result<CompletionOutcome, sqlx::Error> {
    let Some(enrollment) = enrollments::find(pool, student_id, course_id).await? else {
        return Ok(CompletionOutcome::NotEnrolled);
    };
    if enrollment.status != EnrollmentStatus::Active {
        return Ok(CompletionOutcome::AlreadyFinal(enrollment.status));
    }

    let targets = progress::resolve_targets(pool, settings, course_id).await?;
    let attempts = quiz_attempts::list_for_student_course(pool, student_id, course_id).await?;

    match evaluate(
        &attempts,
        targets.completion_quizzes,
        targets.completion_essays,
        settings.final_essay_min_chars,
    ) {
        CompletionDecision::Pending {
            regular_quizzes,
            required_quizzes,
            essays,
            required_essays,
        } => Ok(CompletionOutcome::Pending {
            regular_quizzes,
            required_quizzes,
            essays,
            required_essays,
        }),
        CompletionDecision::Ready { grade, completed_at } => {
            let completed_at = completed_at.unwrap_or_else(primitive_now_utc);
            match complete_enrollment(pool, &enrollment, grade, completed_at).await? {
                Some((_, certificate)) => Ok(CompletionOutcome::Completed {
                    grade,
                    certificate_number: certificate.map(|cert| cert.certificate_number),
                }),
                // Finished concurrently by another request.
                None => Ok(CompletionOutcome::AlreadyFinal(EnrollmentStatus::Completed)),
            }
        }
    }
}

/// Moves an active enrollment to `completed` and issues its certificate.
/// Returns `None` when the enrollment was no longer active.
pub(crate) async fn complete_enrollment(
    pool: &PgPool,
    enrollment: &Enrollment,
    grade: Option<f64>,
    completed_at: PrimitiveDateTime,
) -> Result<Option<(Enrollment, Option<Certificate>)>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(updated) = enrollments::finish(
        &mut *tx,
        enrollment.id,
        EnrollmentStatus::Completed,
        grade,
        Some(completed_at),
    )
    .await?
    else {
        tx.rollback().await?;
        return Ok(None);
    };

    let certificate = certificates::record_completion(
        &mut *tx,
        &updated.student_id,
        updated.course_id,
        completed_at,
        updated.grade,
    )
    .await?;

    tx.commit().await?;

    metrics::record_enrollment_transition("completed");
    tracing::info!(
        user_id = %updated.student_id,
        course_id = updated.course_id,
        grade = ?updated.grade,
        action = "enrollment_completed",
        "Enrollment completed"
    );

    Ok(Some((updated, certificate)))
}

pub(crate) async fn check_all(
    pool: &PgPool,
    settings: &ProgressSettings,
) -> Result<CompletionSweep, sqlx::Error> {
    let active = enrollments::list_active(pool).await?;
    let mut sweep = CompletionSweep::default();

    for enrollment in active {
        sweep.checked += 1;
        let outcome =
            check_enrollment(pool, settings, &enrollment.student_id, enrollment.course_id).await?;
        if outcome.is_completed() {
            sweep.completed += 1;
        }
    }

    tracing::info!(
        checked = sweep.checked,
        completed = sweep.completed,
        action = "completion_sweep",
        "Completion sweep finished"
    );
    Ok(sweep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const MIN_CHARS: usize = 50;

    fn regular(quiz_id: i32, score: f64, completed_at: PrimitiveDateTime) -> CourseAttemptRow {
        CourseAttemptRow {
            quiz_id,
            is_final_exam: false,
            passing_score: 70,
            score,
            completed_at: Some(completed_at),
            essay: None,
        }
    }

    fn final_exam(essay: &str, score: f64, completed_at: PrimitiveDateTime) -> CourseAttemptRow {
        CourseAttemptRow {
            quiz_id: 99,
            is_final_exam: true,
            passing_score: 70,
            score,
            completed_at: Some(completed_at),
            essay: Some(essay.to_string()),
        }
    }

    fn long_essay() -> String {
        "Grace is the unmerited favour of God toward sinners. ".repeat(3)
    }

    #[test]
    fn completes_with_four_quizzes_and_one_essay() {
        let attempts = vec![
            regular(1, 1.0, datetime!(2025-01-01 10:00:00)),
            regular(2, 0.8, datetime!(2025-01-02 10:00:00)),
            regular(3, 0.9, datetime!(2025-01-03 10:00:00)),
            regular(4, 0.7, datetime!(2025-01-04 10:00:00)),
            final_exam(&long_essay(), 0.6, datetime!(2025-01-05 10:00:00)),
        ];

        let decision = evaluate(&attempts, 4, 1, MIN_CHARS);

        assert_eq!(
            decision,
            CompletionDecision::Ready {
                grade: Some(8.0),
                completed_at: Some(datetime!(2025-01-05 10:00:00)),
            }
        );
    }

    #[test]
    fn repeated_attempts_on_one_quiz_do_not_count_twice() {
        let at = datetime!(2025-01-01 10:00:00);
        let attempts = vec![
            regular(1, 1.0, at),
            regular(1, 1.0, at),
            regular(1, 1.0, at),
            regular(1, 1.0, at),
            final_exam(&long_essay(), 1.0, at),
        ];

        match evaluate(&attempts, 4, 1, MIN_CHARS) {
            CompletionDecision::Pending { regular_quizzes, essays, .. } => {
                assert_eq!(regular_quizzes, 1);
                assert_eq!(essays, 1);
            }
            other => panic!("expected pending, got {other:?}"),
        }
    }

    #[test]
    fn short_or_blank_essays_are_not_substantial() {
        let at = datetime!(2025-01-01 10:00:00);
        let exactly_min = "x".repeat(MIN_CHARS);
        let padded = format!("   {}   ", "y".repeat(MIN_CHARS));
        let attempts = vec![
            regular(1, 1.0, at),
            final_exam(&exactly_min, 1.0, at),
            final_exam(&padded, 1.0, at),
            final_exam("", 1.0, at),
        ];

        match evaluate(&attempts, 1, 1, MIN_CHARS) {
            CompletionDecision::Pending { essays, .. } => assert_eq!(essays, 0),
            other => panic!("expected pending, got {other:?}"),
        }
        assert!(is_substantial_essay(Some(&"z".repeat(MIN_CHARS + 1)), MIN_CHARS));
        assert!(!is_substantial_essay(None, MIN_CHARS));
    }

    #[test]
    fn perfect_scores_cap_grade_below_ten() {
        let at = datetime!(2025-01-01 10:00:00);
        let attempts = vec![regular(1, 1.0, at), final_exam(&long_essay(), 1.0, at)];

        match evaluate(&attempts, 1, 1, MIN_CHARS) {
            CompletionDecision::Ready { grade, .. } => assert_eq!(grade, Some(9.99)),
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[test]
    fn zero_requirements_complete_without_attempts() {
        assert_eq!(
            evaluate(&[], 0, 0, MIN_CHARS),
            CompletionDecision::Ready { grade: None, completed_at: None }
        );
    }

    #[test]
    fn final_exam_does_not_count_as_regular_quiz() {
        let at = datetime!(2025-01-01 10:00:00);
        let attempts = vec![final_exam(&long_essay(), 1.0, at), final_exam(&long_essay(), 1.0, at)];

        match evaluate(&attempts, 1, 1, MIN_CHARS) {
            CompletionDecision::Pending { regular_quizzes, essays, .. } => {
                assert_eq!(regular_quizzes, 0);
                assert_eq!(essays, 2);
            }
            other => panic!("expected pending, got {other:?}"),
        }
    }
}
