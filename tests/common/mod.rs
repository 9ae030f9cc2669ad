// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Request;
use llm_code_deploy::config::Config;
use llm_code_deploy::db::TaskDb;
use llm_code_deploy::routes::create_router;
use llm_code_deploy::services::Deployer;
use llm_code_deploy::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

/// Secret accepted by `Config::test_default()`.
#[allow(dead_code)]
pub const TEST_SECRET: &str = "test-secret";

/// Create a test app with an in-memory database and no external credentials.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = TaskDb::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let deployer = Arc::new(Deployer::from_config(&config, db.clone()));

    let state = Arc::new(AppState {
        config,
        db,
        deployer,
    });

    (create_router(state.clone()), state)
}

/// A well-formed task request body.
#[allow(dead_code)]
pub fn task_body(secret: &str, task: &str, nonce: &str) -> Value {
    json!({
        "email": "student@example.com",
        "secret": secret,
        "task": task,
        "round": 1,
        "nonce": nonce,
        "brief": "Create a page that shows Hello World",
        "checks": ["Page has an h1"],
        "attachments": []
    })
}

/// POST a JSON body to `/api-endpoint`.
#[allow(dead_code)]
pub fn intake_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api-endpoint")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
