use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use validator::Validate;

use crate::api::courses::fetch_course;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::{announcements, enrollments};
use crate::core::state::AppState;
use crate::core::time::{parse_rfc3339_utc, primitive_now_utc};
use crate::db::is_unique_violation;
use crate::repositories;
use crate::schemas::auth::MessageResponse;
use crate::schemas::course::{
    AssignmentCreate, AssignmentResponse, CourseCreate, CourseResponse, CourseWithStatsResponse,
    ModuleCreate, ModuleResponse, ReadingCreate, ReadingResponse, RequirementsResponse,
    RequirementsUpdate, VideoCreate, VideoResponse,
};
use crate::schemas::dashboard::AdminAnalytics;
use crate::schemas::quiz::{QuestionAdminResponse, QuestionCreate, QuizCreate, QuizResponse};
use crate::schemas::user::{RoleCount, RoleUpdate, UserListQuery, UserResponse, UserStatsResponse};
use crate::services::progress;

const DEFAULT_USER_PAGE: i64 = 100;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(analytics))
        .route("/user-stats", get(user_stats))
        .route("/users", get(list_users))
        .route("/users/:user_id", delete(delete_user))
        .route("/users/:user_id/role", patch(update_role))
        .route("/users/:user_id/toggle-status", patch(toggle_status))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/:course_id/toggle", patch(toggle_course))
        .route("/courses/:course_id/modules", post(create_module))
        .route("/courses/:course_id/videos", post(create_video))
        .route("/courses/:course_id/readings", post(create_reading))
        .route("/courses/:course_id/quizzes", post(create_quiz))
        .route("/courses/:course_id/assignments", post(create_assignment))
        .route("/courses/:course_id/requirements", get(get_requirements).put(put_requirements))
        .route("/quizzes/:quiz_id/questions", post(create_question))
        .merge(enrollments::admin_router())
        .merge(announcements::admin_router())
}

async fn analytics(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<AdminAnalytics>, ApiError> {
    let totals = repositories::statistics::platform_totals(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load platform analytics"))?;

    Ok(Json(AdminAnalytics::from_db(totals)))
}

async fn user_stats(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserStatsResponse>, ApiError> {
    let counts = repositories::users::count_by_role(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;

    Ok(Json(UserStatsResponse {
        total: counts.iter().map(|(_, count)| count).sum(),
        by_role: counts.into_iter().map(|(role, count)| RoleCount { role, count }).collect(),
    }))
}

async fn list_users(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let filter = repositories::users::UserFilter {
        role: params.role,
        search: params.search,
        skip: params.skip.unwrap_or(0),
        limit: params.limit.unwrap_or(DEFAULT_USER_PAGE),
    };
    let users = repositories::users::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn update_role(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest("You cannot change your own role".to_string()));
    }

    let user = repositories::users::set_role(state.db(), &user_id, payload.role, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update role"))?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        role = user.role.as_str(),
        action = "update_role",
        "User role changed"
    );
    Ok(Json(UserResponse::from_db(user)))
}

async fn toggle_status(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest("You cannot block your own account".to_string()));
    }

    let user = repositories::users::toggle_blocked(state.db(), &user_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update account status"))?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if user.is_blocked {
        let revoked = repositories::auth_tokens::delete_for_user(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to revoke auth tokens"))?;
        tracing::debug!(user_id = %user.id, revoked, "Auth tokens revoked for blocked user");
    }

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        is_blocked = user.is_blocked,
        action = "toggle_status",
        "User status changed"
    );
    Ok(Json(UserResponse::from_db(user)))
}

async fn delete_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    let deleted = repositories::users::delete(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::not_found("User"));
    }

    tracing::info!(admin_id = %admin.id, user_id = %user_id, action = "delete_user", "User deleted");
    Ok(Json(MessageResponse::ok("User deleted")))
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

async fn create_course(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate()?;

    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            name: payload.name.trim(),
            description: payload.description.as_deref(),
            duration_weeks: payload.duration_weeks,
            instructor_id: payload.instructor_id.as_deref(),
            is_active: payload.is_active,
            category: payload.category.as_deref(),
            difficulty: payload.difficulty.as_deref(),
            points: payload.points,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    tracing::info!(admin_id = %admin.id, course_id = course.id, action = "create_course", "Course created");
    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn toggle_course(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = repositories::courses::toggle_active(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to toggle course"))?
        .ok_or_else(|| ApiError::not_found("Course"))?;

    tracing::info!(
        admin_id = %admin.id,
        course_id,
        is_active = course.is_active,
        action = "toggle_course",
        "Course visibility changed"
    );
    Ok(Json(CourseResponse::from_db(course)))
}

async fn create_module(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(payload): Json<ModuleCreate>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    payload.validate()?;
    fetch_course(&state, course_id).await?;

    let module = repositories::course_modules::create(
        state.db(),
        repositories::course_modules::CreateModule {
            course_id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            order_index: payload.order_index,
            week_number: payload.week_number,
            module_type: payload.module_type,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create module"))?;

    Ok((StatusCode::CREATED, Json(ModuleResponse::from_db(module))))
}

async fn create_video(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(payload): Json<VideoCreate>,
) -> Result<(StatusCode, Json<VideoResponse>), ApiError> {
    payload.validate()?;
    fetch_course(&state, course_id).await?;
    ensure_module_in_course(&state, payload.module_id, course_id).await?;

    let video = repositories::course_videos::create(
        state.db(),
        repositories::course_videos::CreateVideo {
            course_id,
            module_id: payload.module_id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            video_url: payload.video_url.trim(),
            duration_seconds: payload.duration_seconds,
            order_index: payload.order_index,
            is_published: payload.is_published,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create video"))?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from_db(video))))
}

async fn create_reading(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(payload): Json<ReadingCreate>,
) -> Result<(StatusCode, Json<ReadingResponse>), ApiError> {
    payload.validate()?;
    fetch_course(&state, course_id).await?;

    let reading = repositories::course_readings::create(
        state.db(),
        repositories::course_readings::CreateReading {
            course_id,
            title: payload.title.trim(),
            author: payload.author.as_deref(),
            content_url: payload.content_url.as_deref(),
            reading_type: payload.reading_type.trim(),
            order_index: payload.order_index,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create reading"))?;

    Ok((StatusCode::CREATED, Json(ReadingResponse::from_db(reading))))
}

async fn create_quiz(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    payload.validate()?;
    fetch_course(&state, course_id).await?;
    ensure_module_in_course(&state, payload.module_id, course_id).await?;

    let quiz = repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            course_id,
            module_id: payload.module_id,
            slug: payload.slug.as_deref().map(str::trim),
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            time_limit_minutes: payload.time_limit_minutes,
            passing_score: payload
                .passing_score
                .unwrap_or(state.settings().progress().quiz_passing_score),
            is_final_exam: payload.is_final_exam,
            is_published: payload.is_published,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Quiz slug already in use".to_string())
        } else {
            ApiError::internal(e, "Failed to create quiz")
        }
    })?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz))))
}

async fn create_assignment(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    payload.validate()?;
    fetch_course(&state, course_id).await?;
    ensure_module_in_course(&state, payload.module_id, course_id).await?;

    let due_date = payload
        .due_date
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(parse_rfc3339_utc)
        .transpose()
        .map_err(|_| ApiError::BadRequest("due_date must be an RFC 3339 timestamp".to_string()))?;

    let assignment = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            course_id,
            module_id: payload.module_id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            due_date,
            max_points: payload.max_points,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment))))
}

async fn create_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(quiz_id): Path<i32>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionAdminResponse>), ApiError> {
    payload.validate()?;

    let quiz = repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz"))?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;

    let question = repositories::quizzes::create_question(
        state.db(),
        repositories::quizzes::CreateQuestion {
            quiz_id: quiz.id,
            question: payload.question.trim(),
            question_type: payload.question_type,
            options: payload.options,
            correct_answer: payload.correct_answer.as_deref(),
            points: payload.points,
            order_index: payload.order_index,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionAdminResponse::from_db(question))))
}

/// Stored requirements, or the values derived from published content.
async fn get_requirements(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<RequirementsResponse>, ApiError> {
    fetch_course(&state, course_id).await?;

    let stored = repositories::course_requirements::find_for_course(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course requirements"))?;
    if let Some(stored) = stored {
        return Ok(Json(RequirementsResponse::from_db(stored)));
    }

    let targets = progress::resolve_targets(state.db(), state.settings().progress(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to derive course requirements"))?;

    Ok(Json(RequirementsResponse {
        course_id,
        required_readings: targets.required_readings,
        required_quizzes: targets.required_quizzes,
        required_videos: targets.required_videos,
        completion_quizzes: targets.completion_quizzes,
        completion_essays: targets.completion_essays,
        reading_source: targets.reading_source,
        configured: false,
        updated_at: None,
    }))
}

async fn put_requirements(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(payload): Json<RequirementsUpdate>,
) -> Result<Json<RequirementsResponse>, ApiError> {
    payload.validate()?;
    fetch_course(&state, course_id).await?;

    let stored = repositories::course_requirements::upsert(
        state.db(),
        repositories::course_requirements::UpsertRequirements {
            course_id,
            required_readings: payload.required_readings,
            required_quizzes: payload.required_quizzes,
            required_videos: payload.required_videos,
            completion_quizzes: payload.completion_quizzes,
            completion_essays: payload.completion_essays,
            reading_source: payload.reading_source,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save course requirements"))?;

    tracing::info!(admin_id = %admin.id, course_id, action = "update_requirements", "Course requirements saved");
    Ok(Json(RequirementsResponse::from_db(stored)))
}

async fn ensure_module_in_course(
    state: &AppState,
    module_id: Option<i32>,
    course_id: i32,
) -> Result<(), ApiError> {
    let Some(module_id) = module_id else {
        return Ok(());
    };

    let belongs = repositories::course_modules::belongs_to_course(state.db(), module_id, course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check module"))?;
    if belongs {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Module does not belong to this course".to_string()))
    }
}

#[cfg(test)]
mod tests;
