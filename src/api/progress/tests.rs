use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn content_progress_is_upserted_per_item() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "junia", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "Luke", true).await;

    for completed in [true, false, true] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/content-progress",
                Some(&token),
                Some(json!({
                    "courseId": course.id,
                    "contentType": "video",
                    "contentId": 5,
                    "completed": completed
                })),
            ))
            .await
            .expect("mark content");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/content-progress/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list progress");
    assert_eq!(response.status(), StatusCode::OK);
    let rows = test_support::read_json(response).await;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["completed"], true);
    assert_eq!(rows[0]["content_type"], "video");
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn reading_progress_is_null_until_saved() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "andronicus", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "John", true).await;
    let uri = format!("/api/reading-progress/{}", course.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("get reading progress");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test_support::read_json(response).await, Value::Null);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/reading-progress",
            Some(&token),
            Some(json!({"courseId": course.id, "chapterIndex": 2, "pageIndex": 3, "totalPages": 10})),
        ))
        .await
        .expect("save reading progress");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("get reading progress");
    let body = test_support::read_json(response).await;
    assert_eq!(body["completion_percentage"], 50.0);
    assert_eq!(body["total_pages"], 10);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn passing_attempt_counts_towards_progress_and_gpa() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "rufus", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "Mark", true).await;
    let (quiz, question) =
        test_support::insert_quiz(ctx.state.db(), course.id, "mark-week-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/analytics/gpa", Some(&token), None))
        .await
        .expect("gpa before attempts");
    let body = test_support::read_json(response).await;
    assert_eq!(body["letter"], "N/A");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/quiz-attempts",
            Some(&token),
            Some(json!({"quizId": quiz.id, "answers": { question.id.to_string(): "B" }})),
        ))
        .await
        .expect("submit attempt");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/progress/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("course progress");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["required_quizzes"], 1);
    assert_eq!(body["completed_quizzes"], 1);
    assert_eq!(body["percentage"], 100);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/analytics/gpa", Some(&token), None))
        .await
        .expect("gpa");
    let body = test_support::read_json(response).await;
    assert_eq!(body["gpa"], 4.0);
    assert_eq!(body["letter"], "A");
    assert_eq!(body["attempts"], 1);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn progress_requires_sign_in() {
    let ctx = test_support::setup_test_context().await;
    let course = test_support::insert_course(ctx.state.db(), "Jude", true).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/progress/{}", course.id),
            None,
            None,
        ))
        .await
        .expect("course progress");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
