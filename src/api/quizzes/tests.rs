use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{EnrollmentStatus, UserRole};
use crate::repositories;
use crate::test_support;

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn quiz_lookup_by_slug_hides_answer_key() {
    let ctx = test_support::setup_test_context().await;
    let course = test_support::insert_course(ctx.state.db(), "Romans", true).await;
    test_support::insert_quiz(ctx.state.db(), course.id, "romans-week-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/quizzes/romans-week-1", None, None))
        .await
        .expect("get quiz");

    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["slug"], "romans-week-1");
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(1));
    assert!(body["questions"][0].get("correct_answer").is_none());
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn attempt_is_scored_and_reviewable() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "eunice", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "Acts", true).await;
    let (quiz, question) =
        test_support::insert_quiz(ctx.state.db(), course.id, "acts-week-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/quiz-attempts",
            Some(&token),
            Some(json!({
                "quizId": quiz.id,
                "answers": { question.id.to_string(): "B" },
                "timeSpent": 90
            })),
        ))
        .await
        .expect("submit attempt");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["attempt"]["score"], 1.0);
    assert_eq!(body["passed"], true);
    assert_eq!(body["course_completed"], false);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/quiz-attempts/{}/review", quiz.id),
            Some(&token),
            None,
        ))
        .await
        .expect("review");
    assert_eq!(response.status(), StatusCode::OK);
    let review = test_support::read_json(response).await;
    assert_eq!(review["questions"][0]["is_correct"], true);
    assert_eq!(review["questions"][0]["correct_answer"], "B");
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn guest_attempt_requires_student_id() {
    let ctx = test_support::setup_test_context().await;
    let course = test_support::insert_course(ctx.state.db(), "Psalms", true).await;
    let (quiz, _) = test_support::insert_quiz(ctx.state.db(), course.id, "psalms-1", false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/quiz-attempts",
            None,
            Some(json!({"quizId": quiz.id, "answers": {}})),
        ))
        .await
        .expect("submit attempt");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/quiz-attempts",
            None,
            Some(json!({"answers": {}})),
        ))
        .await
        .expect("submit without quiz");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn enough_distinct_quizzes_complete_the_course() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "lois", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "Genesis", true).await;
    test_support::set_requirements(ctx.state.db(), course.id, 2).await;
    test_support::enroll(ctx.state.db(), &student.id, course.id).await;

    let (first, _) = test_support::insert_quiz(ctx.state.db(), course.id, "genesis-1", false).await;
    let (second, _) =
        test_support::insert_quiz(ctx.state.db(), course.id, "genesis-2", false).await;

    let mut completed = Vec::new();
    for quiz_ref in [first.slug.clone(), first.slug.clone(), second.slug.clone()] {
        let quiz_ref = quiz_ref.expect("slug");
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/quizzes/{quiz_ref}/attempt"),
                Some(&token),
                Some(json!({"answers": {}})),
            ))
            .await
            .expect("submit attempt");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = test_support::read_json(response).await;
        completed.push(body["course_completed"].as_bool().unwrap_or(false));
    }
    // Repeating the first quiz does not count twice.
    assert_eq!(completed, vec![false, false, true]);

    let enrollment = repositories::enrollments::find(ctx.state.db(), &student.id, course.id)
        .await
        .expect("enrollment")
        .expect("enrollment row");
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);

    let certificates =
        repositories::certificates::list_for_student(ctx.state.db(), &student.id)
            .await
            .expect("certificates");
    assert_eq!(certificates.len(), 1);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn students_cannot_grade_attempts() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "tychicus", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(ctx.state.db(), "Hebrews", true).await;
    let (quiz, _) = test_support::insert_quiz(ctx.state.db(), course.id, "hebrews-final", true).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/quizzes/{}/attempt", quiz.id),
            Some(&token),
            Some(json!({"answers": {}, "essay": "Faith is the substance of things hoped for."})),
        ))
        .await
        .expect("submit attempt");
    let body = test_support::read_json(response).await;
    let attempt_id = body["attempt"]["id"].as_i64().expect("attempt id");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/quiz-attempts/{attempt_id}/grade"),
            Some(&token),
            Some(json!({"finalGrade": 100.0, "certificateApproved": true})),
        ))
        .await
        .expect("grade");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
