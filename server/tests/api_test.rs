//! Integration tests for the HTTP API.
//!
//! The router is driven in-process; no socket is opened.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use delta_server::config::Config;
use delta_server::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "ACCOUNT_ID" => Some("acc-1".to_string()),
        "MAX_OBJECTS_IN_GET" => Some("3".to_string()),
        _ => None,
    })
    .unwrap();
    app(AppState::from_config(config))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post_api(app: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn health_reports_account() {
    let app = test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["accountId"], "acc-1");
    assert_eq!(body["limits"]["maxObjectsInGet"], 3);
    assert_eq!(body["limits"]["maxObjectsInSet"], 500);
    assert_eq!(body["limits"]["maxChanges"], 1024);
}

#[tokio::test]
async fn create_then_resync() {
    let app = test_app();

    let (status, body) = post_api(
        &app,
        json!({
            "using": [],
            "methodCalls": [
                ["Email/set", {"accountId": "acc-1", "create": {"k": {"id": "1"}}}, "c1"],
                ["Email/set", {"update": {"1": {"subject": "x"}}}, "c2"],
            ],
        })
        .to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["methodResponses"][0][0], "Email/set");
    assert_eq!(body["methodResponses"][1][1]["newState"], "2");

    let (status, body) = post_api(
        &app,
        json!({
            "methodCalls": [
                ["Email/changes", {"sinceState": "0"}, "c1"],
                ["Email/get", {"ids": ["1", "999"], "properties": ["subject"]}, "c2"],
            ],
        })
        .to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let changes = &body["methodResponses"][0];
    assert_eq!(changes[0], "Email/changes");
    assert_eq!(changes[1]["created"], json!(["1"]));
    assert_eq!(changes[1]["newState"], "2");
    assert_eq!(changes[2], "c1");

    let get = &body["methodResponses"][1];
    assert_eq!(get[1]["list"], json!([{"id": "1", "subject": "x"}]));
    assert_eq!(get[1]["notFound"], json!(["999"]));
}

#[tokio::test]
async fn method_errors_are_returned_in_band() {
    let app = test_app();

    let (status, body) = post_api(
        &app,
        json!({
            "methodCalls": [
                ["Email/get", {"ids": ["a", "b", "c", "d"]}, "c1"],
                ["Email/get", {"accountId": "someone-else"}, "c2"],
                ["Calendar/get", {}, "c3"],
                ["Core/echo", {"still": "running"}, "c4"],
            ],
        })
        .to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let responses = body["methodResponses"].as_array().unwrap();
    assert_eq!(responses[0][0], "error");
    assert_eq!(responses[0][1]["type"], "requestTooLarge");
    assert_eq!(responses[0][2], "c1");
    assert_eq!(responses[1][1]["type"], "accountNotFound");
    assert_eq!(responses[2][1]["type"], "unknownMethod");
    assert_eq!(responses[3], json!(["Core/echo", {"still": "running"}, "c4"]));
}

#[tokio::test]
async fn not_json_is_rejected() {
    let app = test_app();

    let (status, body) = post_api(&app, "this is not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "notJSON");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn wrong_shape_is_rejected() {
    let app = test_app();

    let (status, body) = post_api(&app, json!({"methodCalls": [["Core/echo"]]}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "notRequest");
}

#[tokio::test]
async fn created_ids_round_trip() {
    let app = test_app();

    let (status, body) = post_api(
        &app,
        json!({
            "methodCalls": [["Mailbox/set", {"create": {"inbox": {"name": "Inbox"}}}, "c1"]],
            "createdIds": {},
        })
        .to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let id = body["methodResponses"][0][1]["created"]["inbox"]["id"].clone();
    assert!(id.is_string());
    assert_eq!(body["createdIds"]["inbox"], id);
}
