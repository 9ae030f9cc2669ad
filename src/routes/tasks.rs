// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task intake and task log routes.

use crate::error::{AppError, Result};
use crate::models::{Attachment, TaskAccepted, TaskRecord, TaskRequest, TaskSummary};
use crate::services::secret::verify_secret;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

/// Public intake route. The secret travels in the request body.
pub fn intake_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api-endpoint", post(receive_task))
}

/// Task log routes. Bearer-secret auth is applied in routes/mod.rs.
pub fn log_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/{nonce}", get(get_task))
}

/// Accept a task, record it and start the deployment in the background.
async fn receive_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<TaskAccepted>> {
    let stored = state
        .config
        .stored_secret_hash
        .as_deref()
        .ok_or(AppError::SecretNotConfigured)?;

    if !verify_secret(&req.secret, stored) {
        tracing::warn!(
            task = %req.task,
            email = %req.email,
            "Security Alert: Task rejected with invalid secret"
        );
        return Err(AppError::InvalidSecret);
    }

    req.validate()?;
    check_attachments(&req.attachments)?;

    let id = state.db.insert_task(&req, stored).await?;
    tracing::info!(
        id,
        task = %req.task,
        round = req.round,
        nonce = %req.nonce,
        attachments = req.attachments.len(),
        "Task received"
    );

    let accepted = TaskAccepted::for_request(&req);
    state.deployer.spawn(req);

    Ok(Json(accepted))
}

/// Reject attachments that claim to be data URIs but do not decode.
/// Other URLs are passed to the LLM untouched.
fn check_attachments(attachments: &[Attachment]) -> Result<()> {
    for attachment in attachments.iter().filter(|a| a.url.starts_with("data:")) {
        let decoded = attachment.decode().map_err(|e| {
            AppError::BadRequest(format!("Attachment {}: {}", attachment.name, e))
        })?;
        tracing::debug!(
            name = %attachment.name,
            mime = %decoded.mime,
            bytes = decoded.data.len(),
            "Attachment decoded"
        );
    }
    Ok(())
}

/// List every recorded task, newest first.
async fn list_tasks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TaskSummary>>> {
    Ok(Json(state.db.list_tasks().await?))
}

/// Latest record for a nonce.
async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(nonce): Path<String>,
) -> Result<Json<TaskRecord>> {
    state
        .db
        .get_task(&nonce)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Task with nonce {} not found", nonce)))
}
