use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn enroll_rejects_duplicates_and_closed_courses() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "apollos", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let open = test_support::insert_course(ctx.state.db(), "Foundations", true).await;
    let closed = test_support::insert_course(ctx.state.db(), "Archive", false).await;

    let enroll = |course_id: i32| {
        test_support::json_request(
            Method::POST,
            "/api/enrollments",
            Some(&token),
            Some(json!({"courseId": course_id})),
        )
    };

    let response = ctx.app.clone().oneshot(enroll(open.id)).await.expect("enroll");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "active");

    let response = ctx.app.clone().oneshot(enroll(open.id)).await.expect("enroll again");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx.app.clone().oneshot(enroll(closed.id)).await.expect("enroll closed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/enrollments/student",
            Some(&token),
            None,
        ))
        .await
        .expect("list enrollments");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["course_name"], "Foundations");
    assert_eq!(body[0]["progress"], 0);
}

/// One attempt, content row, reading row and assignment submission in `course_id`.
async fn seed_learning_rows(pool: &PgPool, student_id: &str, course_id: i32, slug: &str) {
    let (quiz, _) = test_support::insert_quiz(pool, course_id, slug, false).await;
    sqlx::query(
        "INSERT INTO quiz_attempts (student_id, quiz_id, score, started_at, completed_at)
         VALUES ($1, $2, 0.5, NOW(), NOW())",
    )
    .bind(student_id)
    .bind(quiz.id)
    .execute(pool)
    .await
    .expect("insert attempt");
    sqlx::query(
        "INSERT INTO content_progress (student_id, course_id, content_type, content_id, completed, updated_at)
         VALUES ($1, $2, 'video', 1, TRUE, NOW())",
    )
    .bind(student_id)
    .bind(course_id)
    .execute(pool)
    .await
    .expect("insert content progress");
    sqlx::query(
        "INSERT INTO reading_progress (user_id, course_id, chapter_index, page_index, total_pages, completion_percentage, last_read_at)
         VALUES ($1, $2, 1, 1, 4, 50, NOW())",
    )
    .bind(student_id)
    .bind(course_id)
    .execute(pool)
    .await
    .expect("insert reading progress");
    let assignment_id: i32 = sqlx::query_scalar(
        "INSERT INTO assignments (course_id, title, created_at) VALUES ($1, 'Reflection', NOW()) RETURNING id",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await
    .expect("insert assignment");
    sqlx::query(
        "INSERT INTO assignment_submissions (assignment_id, student_id, content, submitted_at)
         VALUES ($1, $2, 'My reflection', NOW())",
    )
    .bind(assignment_id)
    .bind(student_id)
    .execute(pool)
    .await
    .expect("insert submission");
}

/// Row counts for (attempts, content, reading, submissions).
async fn learning_row_counts(pool: &PgPool, student_id: &str, course_id: i32) -> (i64, i64, i64, i64) {
    let count = |sql: &'static str| async move {
        sqlx::query_scalar::<_, i64>(sql)
            .bind(student_id)
            .bind(course_id)
            .fetch_one(pool)
            .await
            .expect("count rows")
    };
    (
        count(
            "SELECT COUNT(*) FROM quiz_attempts a JOIN quizzes q ON q.id = a.quiz_id
             WHERE a.student_id = $1 AND q.course_id = $2",
        )
        .await,
        count("SELECT COUNT(*) FROM content_progress WHERE student_id = $1 AND course_id = $2").await,
        count("SELECT COUNT(*) FROM reading_progress WHERE user_id = $1 AND course_id = $2").await,
        count(
            "SELECT COUNT(*) FROM assignment_submissions s JOIN assignments a ON a.id = s.assignment_id
             WHERE s.student_id = $1 AND a.course_id = $2",
        )
        .await,
    )
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn unenroll_removes_course_activity_only_for_that_course() {
    let ctx = test_support::setup_test_context().await;
    let pool = ctx.state.db();
    let student = test_support::insert_user(pool, "aristarchus", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;
    let course = test_support::insert_course(pool, "Missions", true).await;
    let other = test_support::insert_course(pool, "Evangelism", true).await;
    test_support::enroll(pool, &student.id, course.id).await;
    test_support::enroll(pool, &student.id, other.id).await;
    seed_learning_rows(pool, &student.id, course.id, "missions-1").await;
    seed_learning_rows(pool, &student.id, other.id, "evangelism-1").await;
    assert_eq!(learning_row_counts(pool, &student.id, course.id).await, (1, 1, 1, 1));

    let uri = format!("/api/enrollments/{}", course.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::DELETE, &uri, Some(&token), None))
        .await
        .expect("unenroll");
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(learning_row_counts(pool, &student.id, course.id).await, (0, 0, 0, 0));
    assert_eq!(learning_row_counts(pool, &student.id, other.id).await, (1, 1, 1, 1));
    let remaining: Vec<i32> =
        sqlx::query_scalar("SELECT course_id FROM enrollments WHERE student_id = $1")
            .bind(&student.id)
            .fetch_all(pool)
            .await
            .expect("enrollments");
    assert_eq!(remaining, vec![other.id]);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::DELETE, &uri, Some(&token), None))
        .await
        .expect("unenroll again");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn admin_completion_issues_verifiable_certificate() {
    let ctx = test_support::setup_test_context().await;
    let dean = test_support::insert_user(ctx.state.db(), "gamaliel", UserRole::Dean).await;
    let dean_token = test_support::issue_token(&ctx.state, &dean).await;
    let student = test_support::insert_user(ctx.state.db(), "epaphras", UserRole::Student).await;
    let course = test_support::insert_course(ctx.state.db(), "Leadership", true).await;
    test_support::enroll(ctx.state.db(), &student.id, course.id).await;

    let enrollment = crate::repositories::enrollments::find(ctx.state.db(), &student.id, course.id)
        .await
        .expect("enrollment")
        .expect("enrollment row");
    let uri = format!("/api/admin/enrollments/{}", enrollment.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &uri,
            Some(&dean_token),
            Some(json!({"status": "completed", "grade": 9.5})),
        ))
        .await
        .expect("complete enrollment");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["enrollment"]["status"], "completed");
    let number = body["certificate"]["certificate_number"].as_str().expect("certificate").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &uri,
            Some(&dean_token),
            Some(json!({"status": "dropped"})),
        ))
        .await
        .expect("drop completed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/certificates/verify/{}", number.to_lowercase()),
            None,
            None,
        ))
        .await
        .expect("verify certificate");
    let body = test_support::read_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["certificate"]["certificate_number"], number);
}

#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn students_cannot_transition_enrollments() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(ctx.state.db(), "trophimus", UserRole::Student).await;
    let token = test_support::issue_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/admin/enrollments/check-completions",
            Some(&token),
            None,
        ))
        .await
        .expect("check completions");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
