use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use validator::Validate;

use crate::api::courses::fetch_course;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::{primitive_days_ago, primitive_now_utc};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::MessageResponse;
use crate::schemas::course::{CourseWithStatsResponse, ReadingResponse, VideoResponse};
use crate::schemas::dashboard::{
    completion_rate, CoursePerformance, GenderCount, MinistryOverview, PermissionGrant,
    PermissionResponse, StudentSummary,
};
use crate::schemas::quiz::QuizResponse;
use crate::services::progress;

const DEANS_LIST_GPA: f64 = 3.5;
const DASHBOARD_LIST_LEN: usize = 10;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/ministry-overview", get(ministry_overview))
        .route("/student-management", get(student_management))
        .route("/courses", get(list_courses))
        .route("/videos", get(list_videos))
        .route("/readings", get(list_readings))
        .route("/quizzes", get(list_quizzes))
        .route("/instructor-permissions", get(list_permissions).post(grant_permission))
        .route("/instructor-permissions/:permission_id", delete(revoke_permission))
}

async fn ministry_overview(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<MinistryOverview>, ApiError> {
    let rows = repositories::statistics::student_summaries(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student statistics"))?;
    let new_students_this_week =
        repositories::statistics::count_students_since(state.db(), primitive_days_ago(7))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count new students"))?;
    let total_courses = repositories::courses::count(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count courses"))?;
    let genders = repositories::statistics::gender_counts(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load gender statistics"))?;
    let courses = repositories::courses::list_with_stats(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course statistics"))?;

    let students: Vec<StudentSummary> = rows.into_iter().map(StudentSummary::from_db).collect();
    let ranked = rank_students(&students);

    let overview = MinistryOverview {
        total_students: students.len() as i64,
        new_students_this_week,
        total_courses,
        average_gpa: ranked.average_gpa,
        deans_list_count: ranked.deans_list_count,
        gender_distribution: genders
            .into_iter()
            .map(|(gender, count)| GenderCount { gender, count })
            .collect(),
        top_students: ranked.top_indices.iter().map(|&idx| students[idx].clone()).collect(),
        // Summaries arrive newest first.
        recent_students: students.into_iter().take(DASHBOARD_LIST_LEN).collect(),
        course_performance: courses
            .into_iter()
            .map(|row| CoursePerformance {
                course_id: row.course.id,
                course_name: row.course.name,
                is_active: row.course.is_active,
                enrollments: row.enrollment_count,
                completed: row.completed_count,
                completion_rate: completion_rate(row.completed_count, row.enrollment_count),
            })
            .collect(),
    };

    Ok(Json(overview))
}

async fn student_management(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentSummary>>, ApiError> {
    let rows = repositories::statistics::student_summaries(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student statistics"))?;

    Ok(Json(rows.into_iter().map(StudentSummary::from_db).collect()))
}

async fn list_courses(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseWithStatsResponse>>, ApiError> {
    let courses = repositories::courses::list_with_stats(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseWithStatsResponse::from_db).collect()))
}

async fn list_videos(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoResponse>>, ApiError> {
    let videos = repositories::course_videos::list_all_with_course(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list videos"))?;

    Ok(Json(
        videos
            .into_iter()
            .map(|row| VideoResponse::from_db(row.video).with_course_name(row.course_name))
            .collect(),
    ))
}

async fn list_readings(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReadingResponse>>, ApiError> {
    let readings = repositories::course_readings::list_all_with_course(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list readings"))?;

    Ok(Json(
        readings
            .into_iter()
            .map(|row| ReadingResponse::from_db(row.reading).with_course_name(row.course_name))
            .collect(),
    ))
}

async fn list_quizzes(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizResponse>>, ApiError> {
    let quizzes = repositories::quizzes::list_all_with_course(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    Ok(Json(
        quizzes
            .into_iter()
            .map(|row| {
                let mut quiz = QuizResponse::from_db(row.quiz);
                quiz.course_name = Some(row.course_name);
                quiz.question_count = Some(row.question_count);
                quiz
            })
            .collect(),
    ))
}

async fn list_permissions(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    let permissions = repositories::instructor_permissions::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list instructor permissions"))?;

    Ok(Json(permissions.into_iter().map(PermissionResponse::from_view).collect()))
}

async fn grant_permission(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<PermissionGrant>,
) -> Result<(StatusCode, Json<PermissionResponse>), ApiError> {
    payload.validate()?;

    let instructor = repositories::users::find_by_id(state.db(), &payload.instructor_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load instructor"))?
        .ok_or_else(|| ApiError::not_found("Instructor"))?;
    if instructor.role != UserRole::Instructor {
        return Err(ApiError::BadRequest("User is not an instructor".to_string()));
    }
    fetch_course(&state, payload.course_id).await?;

    let permission = repositories::instructor_permissions::grant(
        state.db(),
        repositories::instructor_permissions::GrantPermission {
            instructor_id: &instructor.id,
            course_id: payload.course_id,
            granted_by_id: &admin.id,
            permissions: &payload.permissions,
            granted_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to grant instructor permission"))?;

    tracing::info!(
        admin_id = %admin.id,
        instructor_id = %instructor.id,
        course_id = payload.course_id,
        action = "grant_permission",
        "Instructor permission granted"
    );

    Ok((StatusCode::CREATED, Json(PermissionResponse::from_db(permission))))
}

async fn revoke_permission(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(permission_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let revoked =
        repositories::instructor_permissions::revoke(state.db(), permission_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to revoke instructor permission"))?;
    if !revoked {
        return Err(ApiError::not_found("Active permission"));
    }

    tracing::info!(admin_id = %admin.id, permission_id, action = "revoke_permission", "Instructor permission revoked");
    Ok(Json(MessageResponse::ok("Permission revoked")))
}

#[derive(Debug, PartialEq)]
struct StudentRanking {
    average_gpa: f64,
    deans_list_count: usize,
    top_indices: Vec<usize>,
}

/// Only students with at least one scored attempt are ranked or averaged.
fn rank_students(students: &[StudentSummary]) -> StudentRanking {
    let mut graded: Vec<usize> = students
        .iter()
        .enumerate()
        .filter(|(_, student)| student.average_score.is_some())
        .map(|(idx, _)| idx)
        .collect();

    let average_gpa = if graded.is_empty() {
        0.0
    } else {
        let total: f64 = graded.iter().map(|&idx| students[idx].gpa).sum();
        progress::round2(total / graded.len() as f64)
    };
    let deans_list_count =
        graded.iter().filter(|&&idx| students[idx].gpa >= DEANS_LIST_GPA).count();

    graded.sort_by(|&a, &b| {
        let left = students[a].average_score.unwrap_or(0.0);
        let right = students[b].average_score.unwrap_or(0.0);
        right.total_cmp(&left)
    });
    graded.truncate(DASHBOARD_LIST_LEN);

    StudentRanking { average_gpa, deans_list_count, top_indices: graded }
}
