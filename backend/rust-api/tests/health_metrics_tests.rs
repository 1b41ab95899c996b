use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn health_reports_store_status() {
    let (app, _store) = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["dependencies"]["store"]["status"], "healthy");
}

#[tokio::test]
async fn metrics_require_basic_auth() {
    let (app, _store) = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = general_purpose::STANDARD.encode("admin:wrong");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .header(header::AUTHORIZATION, format!("Basic {}", wrong))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Matches Config::for_tests().metrics_auth
    let good = general_purpose::STANDARD.encode("admin:test");
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .header(header::AUTHORIZATION, format!("Basic {}", good))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_csp_header() {
    let (app, _store) = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let csp = response
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .expect("CSP header present");
    assert!(csp.to_str().unwrap().contains("default-src 'self'"));
}
