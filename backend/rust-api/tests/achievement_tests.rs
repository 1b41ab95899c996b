use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;

mod common;

/// Registers and logs in a user; returns the bearer access token.
async fn authenticated_token(app: &Router) -> String {
    let register_body = json!({
        "email": "anna@example.com",
        "password": "password123",
        "username": "anna_b",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(register_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let login_body = json!({
        "email": "anna@example.com",
        "password": "password123",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(login_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    json["access_token"].as_str().unwrap().to_string()
}

async fn get_json(app: &Router, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn update_level(
    app: &Router,
    token: &str,
    level: &str,
    score: i32,
) -> (StatusCode, serde_json::Value) {
    post_json(
        app,
        "/api/v1/quiz/achievements/update",
        token,
        json!({ "level": level, "score": score }),
    )
    .await
}

#[tokio::test]
async fn quiz_endpoints_require_bearer_auth() {
    let (app, _store) = common::create_test_app().await;

    for uri in [
        "/api/v1/quiz/achievements/check",
        "/api/v1/quiz/status",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn empty_history_has_all_tiers_incomplete() {
    let (app, _store) = common::create_test_app().await;
    let token = authenticated_token(&app).await;

    let (status, json) = get_json(&app, "/api/v1/quiz/achievements/check", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["completions"].as_array().unwrap().len(), 0);
    assert_eq!(json["status"]["beginner"], false);
    assert_eq!(json["status"]["intermediate"], false);
    assert_eq!(json["status"]["advanced"], false);
}

#[tokio::test]
async fn intermediate_is_gated_on_beginner() {
    let (app, _store) = common::create_test_app().await;
    let token = authenticated_token(&app).await;

    let (status, json) = update_level(&app, &token, "INTERMEDIATE", 90).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "You must complete the beginner level first");

    // Nothing was written.
    let (_, json) = get_json(&app, "/api/v1/quiz/achievements/check", &token).await;
    assert_eq!(json["completions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn full_progression_beginner_to_advanced() {
    let (app, _store) = common::create_test_app().await;
    let token = authenticated_token(&app).await;

    let (status, json) = update_level(&app, &token, "BEGINNER", 80).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["quiz_completion"]["level"], "BEGINNER");
    assert_eq!(json["quiz_completion"]["score"], 80);

    let (status, _) = update_level(&app, &token, "INTERMEDIATE", 70).await;
    assert_eq!(status, StatusCode::OK);

    // Advanced gated until intermediate done, then accepted.
    let (status, _) = update_level(&app, &token, "ADVANCED", 95).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = get_json(&app, "/api/v1/quiz/achievements/check", &token).await;
    assert_eq!(json["completions"].as_array().unwrap().len(), 3);
    assert_eq!(json["status"]["beginner"], true);
    assert_eq!(json["status"]["intermediate"], true);
    assert_eq!(json["status"]["advanced"], true);
}

#[tokio::test]
async fn completions_are_listed_newest_first() {
    let (app, _store) = common::create_test_app().await;
    let token = authenticated_token(&app).await;

    // Small gaps so completedAt ordering is unambiguous.
    update_level(&app, &token, "BEGINNER", 80).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    update_level(&app, &token, "INTERMEDIATE", 70).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    update_level(&app, &token, "ADVANCED", 95).await;

    let (_, json) = get_json(&app, "/api/v1/quiz/achievements/check", &token).await;
    let completions = json["completions"].as_array().unwrap();
    let timestamps: Vec<&str> = completions
        .iter()
        .map(|c| c["completed_at"].as_str().unwrap())
        .collect();
    let mut sorted = timestamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(timestamps, sorted);
    assert_eq!(completions[0]["level"], "ADVANCED");
}

#[tokio::test]
async fn repeat_completion_overwrites_instead_of_duplicating() {
    let (app, _store) = common::create_test_app().await;
    let token = authenticated_token(&app).await;

    update_level(&app, &token, "beginner", 60).await;
    let (status, json) = update_level(&app, &token, "beginner", 85).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["quiz_completion"]["score"], 85);

    let (_, json) = get_json(&app, "/api/v1/quiz/achievements/check", &token).await;
    let completions = json["completions"].as_array().unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0]["score"], 85);
}

#[tokio::test]
async fn unknown_level_and_bad_score_are_rejected() {
    let (app, _store) = common::create_test_app().await;
    let token = authenticated_token(&app).await;

    let (status, _) = update_level(&app, &token, "EXPERT", 50).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = update_level(&app, &token, "BEGINNER", 101).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = update_level(&app, &token, "BEGINNER", -1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proficiency_status_flips_once_and_stays() {
    let (app, _store) = common::create_test_app().await;
    let token = authenticated_token(&app).await;

    let (status, json) = get_json(&app, "/api/v1/quiz/status", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["has_completed"], false);

    let (status, json) = post_json(&app, "/api/v1/quiz/status/complete", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (_, json) = get_json(&app, "/api/v1/quiz/status", &token).await;
    assert_eq!(json["has_completed"], true);

    // Idempotent second call.
    let (status, _) = post_json(&app, "/api/v1/quiz/status/complete", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = get_json(&app, "/api/v1/quiz/status", &token).await;
    assert_eq!(json["has_completed"], true);
}
