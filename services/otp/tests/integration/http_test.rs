use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use otpgate_otp::infra::mail::HttpMailNotifier;
use otpgate_otp::router::build_router;
use otpgate_otp::state::AppState;

use crate::helpers::{test_hasher, test_ttl};

/// Router over a disconnected database: anything that reaches the store
/// fails, so only validation and plumbing paths succeed.
fn test_server() -> TestServer {
    let notifier = HttpMailNotifier::new(
        "http://127.0.0.1:9/mail",
        Duration::from_millis(200),
        test_ttl(),
    )
    .unwrap();
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        notifier,
        hasher: test_hasher(),
        ttl: test_ttl(),
    };
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn should_report_liveness() {
    let server = test_server();

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn should_report_unready_without_database() {
    let server = test_server();

    let response = server.get("/readyz").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn should_reject_verify_without_identity() {
    let server = test_server();

    let response = server
        .post("/otp/verify")
        .json(&json!({ "email": "", "otp": "123456" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_ARGUMENT");
    assert_eq!(body["message"], "identity is required");
}

#[tokio::test]
async fn should_reject_verify_without_code() {
    let server = test_server();

    let response = server
        .post("/otp/verify")
        .json(&json!({ "identity": "a@x.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "code is required");
}

#[tokio::test]
async fn should_reject_issue_without_org() {
    let server = test_server();

    let response = server
        .post("/otp/requests")
        .json(&json!({ "email": "a@x.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_ARGUMENT");
    assert_eq!(body["message"], "org_id is required");
}

#[tokio::test]
async fn should_hide_store_failure_details() {
    let server = test_server();

    let response = server
        .post("/otp/verify")
        .json(&json!({ "identity": "a@x.com", "code": "123456" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["kind"], "PERSISTENCE_ERROR");
    assert_eq!(body["message"], "persistence error");
}

#[tokio::test]
async fn should_attach_request_id_to_responses() {
    let server = test_server();

    let generated = server.get("/healthz").await;
    assert!(generated.headers().contains_key("x-request-id"));

    let echoed = server
        .get("/healthz")
        .add_header("x-request-id", "req-42")
        .await;
    assert_eq!(echoed.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn should_reject_unknown_kind_as_invalid_argument() {
    let server = test_server();

    let response = server
        .post("/otp/requests")
        .json(&json!({ "email": "a@x.com", "org_id": "org-1", "kind": "password_reset" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_ARGUMENT");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body:")
    );
}

#[tokio::test]
async fn should_reject_malformed_request_id_as_invalid_argument() {
    let server = test_server();

    let response = server
        .post("/otp/verify")
        .json(&json!({ "email": "a@x.com", "otp": "123456", "request_id": "not-a-uuid" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_ARGUMENT");
}
