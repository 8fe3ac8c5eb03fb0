use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::repositories;
use crate::test_support;

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn admin_routes_reject_students() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "erastus", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/admin/analytics", Some(&token), None))
        .await
        .expect("analytics");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/admin/analytics", None, None))
        .await
        .expect("analytics as guest");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn admins_cannot_demote_or_block_themselves() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "sosthenes", UserRole::Admin).await;
    let token = test_support::issue_token(&ctx.state, &admin).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/admin/users/{}/role", admin.id),
            Some(&token),
            Some(json!({"role": "student"})),
        ))
        .await
        .expect("self role change");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/admin/users/{}/toggle-status", admin.id),
            Some(&token),
            None,
        ))
        .await
        .expect("self block");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn blocking_a_user_revokes_their_sessions() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "crispus", UserRole::Admin).await;
    let admin_token = test_support::issue_token(&ctx.state, &admin).await;
    let student = test_support::insert_user(ctx.state.db(), "gaius", UserRole::Student).await;
    let student_token = test_support::issue_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/admin/users/{}/toggle-status", student.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("block student");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["is_blocked"], true);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/auth/user",
            Some(&student_token),
            None,
        ))
        .await
        .expect("current user");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn requirements_fall_back_to_published_content_until_saved() {
    let ctx = test_support::setup_test_context().await;
    let dean = test_support::insert_user(ctx.state.db(), "lucius", UserRole::Dean).await;
    let token = test_support::issue_token(&ctx.state, &dean).await;
    let course = test_support::insert_course(ctx.state.db(), "Theology", true).await;
    test_support::insert_quiz(ctx.state.db(), course.id, "theology-1", false).await;
    let uri = format!("/api/admin/courses/{}/requirements", course.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("derived requirements");
    let body = test_support::read_json(response).await;
    assert_eq!(body["configured"], false);
    assert_eq!(body["required_quizzes"], 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({
                "requiredReadings": 4,
                "requiredQuizzes": 5,
                "requiredVideos": 0,
                "readingSource": "book"
            })),
        ))
        .await
        .expect("save requirements");
    assert_eq!(response.status(), StatusCode::OK);

    let stored = repositories::course_requirements::find_for_course(ctx.state.db(), course.id)
        .await
        .expect("requirements")
        .expect("stored requirements");
    assert_eq!(stored.required_quizzes, 5);
    assert_eq!(stored.completion_quizzes, 4);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn videos_reject_modules_from_other_courses() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "zenas", UserRole::Admin).await;
    let token = test_support::issue_token(&ctx.state, &admin).await;
    let first = test_support::insert_course(ctx.state.db(), "Worship", true).await;
    let second = test_support::insert_course(ctx.state.db(), "Music", true).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/admin/courses/{}/modules", first.id),
            Some(&token),
            Some(json!({"title": "Week 1", "weekNumber": 1})),
        ))
        .await
        .expect("create module");
    assert_eq!(response.status(), StatusCode::CREATED);
    let module = test_support::read_json(response).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/admin/courses/{}/videos", second.id),
            Some(&token),
            Some(json!({
                "moduleId": module["id"],
                "title": "Hymn history",
                "videoUrl": "https://videos.example.org/hymns"
            })),
        ))
        .await
        .expect("create video");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn announcements_are_published_and_withdrawn() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "artemas", UserRole::Admin).await;
    let token = test_support::issue_token(&ctx.state, &admin).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/admin/announcements",
            Some(&token),
            Some(json!({"title": "Retreat", "content": "Registration opens Monday."})),
        ))
        .await
        .expect("create announcement");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = test_support::read_json(response).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/announcements", None, None))
        .await
        .expect("list announcements");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/admin/announcements/{}", created["id"]),
            Some(&token),
            None,
        ))
        .await
        .expect("deactivate announcement");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/announcements", None, None))
        .await
        .expect("list announcements");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}
