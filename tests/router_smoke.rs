use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use zield::{build_router, config::Config, credentials::Credentials, db, models::Role, AppState};

fn spawn_app() -> Router {
    let mut cfg = Config::with_secret("smoke-test-secret");
    cfg.hash_memory_kib = 256;
    cfg.hash_iterations = 1;
    let conn = db::open_in_memory().expect("open store");
    let state = AppState::new(cfg, conn).expect("build state");
    build_router(Arc::clone(&state))
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("call router");
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

#[tokio::test]
async fn health_reports_version() {
    let app = spawn_app();
    let (status, body) = call(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_routes_use_error_envelope() {
    let app = spawn_app();

    let (status, body) = call(&app, get("/api/v1/courses")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "error": "Route not found" }));

    let (status, body) = call(&app, get("/health")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = spawn_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/students")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .expect("build request");

    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/teachers/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("[1, 2, 3]"))
        .expect("build request");
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "request body must be a JSON object");
}

#[tokio::test]
async fn protected_routes_reject_missing_and_forged_tokens() {
    let app = spawn_app();
    let unauthorized = json!({ "success": false, "error": "Not authorized to access this route" });

    let (status, body) = call(&app, get("/api/v1/teachers/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, unauthorized);

    let req = Request::builder()
        .uri("/api/v1/teachers/me")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .expect("build request");
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, unauthorized);

    // Signed with a different secret.
    let mut other = Config::with_secret("some-other-secret");
    other.hash_memory_kib = 256;
    other.hash_iterations = 1;
    let forged = Credentials::new(&other)
        .expect("credentials")
        .issue_token("whoever", Role::Admin)
        .expect("token");
    let req = Request::builder()
        .uri("/api/v1/students")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .expect("build request");
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, unauthorized);
}

#[tokio::test]
async fn valid_token_for_unknown_account_is_rejected() {
    let mut cfg = Config::with_secret("smoke-test-secret");
    cfg.hash_memory_kib = 256;
    cfg.hash_iterations = 1;
    let token = Credentials::new(&cfg)
        .expect("credentials")
        .issue_token("never-registered", Role::Admin)
        .expect("token");

    let app = spawn_app();
    let req = Request::builder()
        .uri("/api/v1/teachers")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("build request");
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn timed_out_request_uses_error_envelope() {
    // Full-cost hashing cannot finish inside a millisecond.
    let mut cfg = Config::with_secret("smoke-test-secret");
    cfg.request_timeout = std::time::Duration::from_millis(1);
    let conn = db::open_in_memory().expect("open store");
    let app = build_router(AppState::new(cfg, conn).expect("build state"));

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/students")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "name": "Slow Poke",
                "email": "slow@example.com",
                "contactNo": "555-0101",
                "address": "3 Long Road",
                "className": "Grade 9",
                "startDate": "2024-01-01",
                "endDate": "2024-06-30",
                "password": "patience"
            })
            .to_string(),
        ))
        .expect("build request");

    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, json!({ "success": false, "error": "Request timed out" }));
}
