use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;

use crate::core::config::ProgressSettings;
use crate::db::types::{ContentType, ReadingSource};
use crate::repositories::{
    content_progress, course_readings, course_requirements, course_videos, quiz_attempts, quizzes,
    reading_progress,
};
use crate::repositories::quiz_attempts::CourseAttemptRow;
use crate::services::quiz_scoring;

/// Requirements for one course, either stored or derived from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CourseTargets {
    pub(crate) required_readings: i64,
    pub(crate) required_quizzes: i64,
    pub(crate) required_videos: i64,
    pub(crate) completion_quizzes: i64,
    pub(crate) completion_essays: i64,
    pub(crate) reading_source: ReadingSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CompletedCounts {
    pub(crate) readings: i64,
    pub(crate) quizzes: i64,
    pub(crate) videos: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CourseProgress {
    pub(crate) course_id: i32,
    pub(crate) percentage: i64,
    pub(crate) completed_readings: i64,
    pub(crate) completed_quizzes: i64,
    pub(crate) completed_videos: i64,
    pub(crate) required_readings: i64,
    pub(crate) required_quizzes: i64,
    pub(crate) required_videos: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct GpaSummary {
    pub(crate) gpa: f64,
    pub(crate) average_percent: f64,
    pub(crate) attempts: usize,
    pub(crate) letter: &'static str,
}

pub(crate) async fn resolve_targets(
    pool: &PgPool,
    settings: &ProgressSettings,
    course_id: i32,
) -> Result<CourseTargets, sqlx::Error> {
    if let Some(stored) = course_requirements::find_for_course(pool, course_id).await? {
        return Ok(CourseTargets {
            required_readings: i64::from(stored.required_readings),
            required_quizzes: i64::from(stored.required_quizzes),
            required_videos: i64::from(stored.required_videos),
            completion_quizzes: i64::from(stored.completion_quizzes),
            completion_essays: i64::from(stored.completion_essays),
            reading_source: stored.reading_source,
        });
    }

    let required_readings = course_readings::count_active_for_course(pool, course_id).await?;
    let required_quizzes = quizzes::count_published_for_course(pool, course_id).await?;
    let required_videos = course_videos::count_published_for_course(pool, course_id).await?;

    Ok(CourseTargets {
        required_readings,
        required_quizzes,
        required_videos,
        completion_quizzes: i64::from(settings.default_required_quizzes),
        completion_essays: 1,
        reading_source: ReadingSource::Content,
    })
}

pub(crate) async fn course_progress(
    pool: &PgPool,
    settings: &ProgressSettings,
    student_id: &str,
    course_id: i32,
) -> Result<CourseProgress, sqlx::Error> {
    let targets = resolve_targets(pool, settings, course_id).await?;

    let attempts = quiz_attempts::list_for_student_course(pool, student_id, course_id).await?;
    let videos =
        content_progress::count_completed(pool, student_id, course_id, ContentType::Video).await?;
    let readings = match targets.reading_source {
        ReadingSource::Content => {
            content_progress::count_completed(pool, student_id, course_id, ContentType::Reading)
                .await?
        }
        ReadingSource::Book => reading_progress::find(pool, student_id, course_id)
            .await?
            .map_or(0, |row| i64::from(row.completion_percentage >= 100.0)),
    };

    let completed = CompletedCounts {
        readings,
        quizzes: passed_quiz_count(&attempts),
        videos,
    };

    Ok(build_progress(course_id, &targets, completed))
}

pub(crate) async fn student_gpa(pool: &PgPool, student_id: &str) -> Result<GpaSummary, sqlx::Error> {
    let scores = quiz_attempts::scores_for_student(pool, student_id).await?;
    Ok(gpa_summary(&scores))
}

/// Distinct quizzes with at least one attempt at or above their passing score.
pub(crate) fn passed_quiz_count(attempts: &[CourseAttemptRow]) -> i64 {
    let passed: HashSet<i32> = attempts
        .iter()
        .filter(|attempt| quiz_scoring::is_passing(attempt.score, attempt.passing_score))
        .map(|attempt| attempt.quiz_id)
        .collect();
    passed.len() as i64
}

pub(crate) fn build_progress(
    course_id: i32,
    targets: &CourseTargets,
    completed: CompletedCounts,
) -> CourseProgress {
    let completed_readings = completed.readings.clamp(0, targets.required_readings.max(0));
    let completed_quizzes = completed.quizzes.clamp(0, targets.required_quizzes.max(0));
    let completed_videos = completed.videos.clamp(0, targets.required_videos.max(0));

    let required_total = targets.required_readings.max(0)
        + targets.required_quizzes.max(0)
        + targets.required_videos.max(0);
    let completed_total = completed_readings + completed_quizzes + completed_videos;

    CourseProgress {
        course_id,
        percentage: completion_percentage(completed_total, required_total),
        completed_readings,
        completed_quizzes,
        completed_videos,
        required_readings: targets.required_readings,
        required_quizzes: targets.required_quizzes,
        required_videos: targets.required_videos,
    }
}

pub(crate) fn completion_percentage(completed: i64, required: i64) -> i64 {
    if required <= 0 {
        return 0;
    }
    let ratio = completed as f64 / required as f64 * 100.0;
    (ratio.round() as i64).clamp(0, 100)
}

pub(crate) fn reading_completion_percentage(
    chapter_index: i32,
    page_index: i32,
    total_pages: i32,
) -> f64 {
    if total_pages <= 0 {
        return 0.0;
    }
    let position = f64::from(chapter_index.max(0)) + f64::from(page_index.max(0));
    (position / f64::from(total_pages) * 100.0).min(100.0)
}

/// Mean of fractional scores, as a percent.
pub(crate) fn average_percent(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: f64 = scores.iter().sum();
    Some(round2(sum / scores.len() as f64 * 100.0))
}

/// Tolerance for float noise such as `0.29 * 100.0 == 28.999999999999996`.
const BUCKET_EPSILON: f64 = 1e-9;

/// Buckets the unrounded percent; only float noise is absorbed.
pub(crate) fn gpa_from_percent(percent: f64) -> f64 {
    let percent = percent + BUCKET_EPSILON;
    if percent >= 90.0 {
        4.0
    } else if percent >= 80.0 {
        3.0
    } else if percent >= 70.0 {
        2.0
    } else if percent >= 60.0 {
        1.0
    } else {
        0.0
    }
}

pub(crate) fn letter_grade(percent: f64) -> &'static str {
    match gpa_from_percent(percent) as u8 {
        4 => "A",
        3 => "B",
        2 => "C",
        1 => "D",
        _ => "F",
    }
}

pub(crate) fn gpa_summary(scores: &[f64]) -> GpaSummary {
    match average_percent(scores) {
        Some(average) => GpaSummary {
            gpa: gpa_from_percent(average),
            average_percent: average,
            attempts: scores.len(),
            letter: letter_grade(average),
        },
        None => GpaSummary {
            gpa: 0.0,
            average_percent: 0.0,
            attempts: 0,
            letter: "N/A",
        },
    }
}

/// Enrollment grade on a ten-point scale, kept under 10.
pub(crate) fn enrollment_grade(average_percent: f64) -> f64 {
    round2((average_percent / 10.0).min(9.99))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
