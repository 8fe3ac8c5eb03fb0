use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn catalogue_lists_only_active_courses() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_course(ctx.state.db(), "Discipleship", true).await;
    let hidden = test_support::insert_course(ctx.state.db(), "Retired", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/courses", None, None))
        .await
        .expect("list courses");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let names: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|course| course["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Discipleship"]);

    // Inactive courses stay reachable by id.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/courses/{}", hidden.id),
            None,
            None,
        ))
        .await
        .expect("get course");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/courses/9999", None, None))
        .await
        .expect("missing course");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn course_quizzes_carry_the_callers_attempts() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "mnason", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "Prayer", true).await;
    let (quiz, question) =
        test_support::insert_quiz(ctx.state.db(), course.id, "prayer-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/quiz-attempts",
            Some(&token),
            Some(json!({"quizId": quiz.id, "answers": { question.id.to_string(): "A" }})),
        ))
        .await
        .expect("submit attempt");
    assert_eq!(response.status(), StatusCode::CREATED);

    let uri = format!("/api/courses/{}/quizzes", course.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("list quizzes");
    let body = test_support::read_json(response).await;
    assert_eq!(body[0]["completed"], true);
    assert_eq!(body[0]["attempts"], 1);
    assert_eq!(body[0]["best_score"], 0.0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, None, None))
        .await
        .expect("list quizzes as guest");
    let body = test_support::read_json(response).await;
    assert_eq!(body[0]["completed"], false);
    assert_eq!(body[0]["attempts"], 0);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn assignment_submission_requires_enrollment() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "stephanas", UserRole::Admin).await;
    let admin_token = test_support::issue_token(&ctx.state, &admin).await;
    let student = test_support::insert_user(ctx.state.db(), "fortunatus", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "Homiletics", true).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/admin/courses/{}/assignments", course.id),
            Some(&admin_token),
            Some(json!({"title": "Sermon outline", "dueDate": "2030-05-01T17:00:00Z"})),
        ))
        .await
        .expect("create assignment");
    let status = response.status();
    let assignment = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {assignment}");
    let assignment_id = assignment["id"].as_i64().expect("assignment id");

    let submit = || {
        test_support::json_request(
            Method::POST,
            &format!("/api/courses/assignments/{assignment_id}/submit"),
            Some(&token),
            Some(json!({"content": "Three points and a poem."})),
        )
    };

    let response = ctx.app.clone().oneshot(submit()).await.expect("submit unenrolled");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    test_support::enroll(ctx.state.db(), &student.id, course.id).await;
    let response = ctx.app.clone().oneshot(submit()).await.expect("submit enrolled");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["content"], "Three points and a poem.");
}
