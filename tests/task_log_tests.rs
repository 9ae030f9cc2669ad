// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for the authenticated task log routes and the health check.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use llm_code_deploy::models::TaskRequest;
use tower::ServiceExt;

mod common;

fn get(uri: &str, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(secret) = secret {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", secret));
    }
    builder.body(Body::empty()).unwrap()
}

async fn seed(state: &llm_code_deploy::AppState, task: &str, nonce: &str) {
    let req: TaskRequest =
        serde_json::from_value(common::task_body(common::TEST_SECRET, task, nonce)).unwrap();
    state.db.insert_task(&req, "stored-hash").await.unwrap();
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = common::create_test_app().await;

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );

    let json = common::body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_list_requires_auth_header() {
    let (app, _) = common::create_test_app().await;

    let response = app.oneshot(get("/tasks", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_rejects_wrong_secret() {
    let (app, _) = common::create_test_app().await;

    let response = app.oneshot(get("/tasks", Some("nope"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_returns_newest_first() {
    let (app, state) = common::create_test_app().await;
    seed(&state, "first", "n-1").await;
    seed(&state, "second", "n-2").await;

    let response = app
        .oneshot(get("/tasks", Some(common::TEST_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = common::body_json(response).await;
    let tasks = json.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["task"], "second");
    assert_eq!(tasks[1]["task"], "first");
    assert_eq!(tasks[0]["status"], "received");
}

#[tokio::test]
async fn test_get_task_hides_secret_hash() {
    let (app, state) = common::create_test_app().await;
    seed(&state, "demo", "abc-123").await;

    let response = app
        .oneshot(get("/tasks/abc-123", Some(common::TEST_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = common::body_json(response).await;
    assert_eq!(json["nonce"], "abc-123");
    assert_eq!(json["brief"], "Create a page that shows Hello World");
    assert!(json.get("secret_hash").is_none());
}

#[tokio::test]
async fn test_get_unknown_task_not_found() {
    let (app, _) = common::create_test_app().await;

    let response = app
        .oneshot(get("/tasks/missing", Some(common::TEST_SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = common::body_json(response).await;
    assert_eq!(json["error"], "not_found");
}
