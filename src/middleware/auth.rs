// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret authentication middleware for the task log routes.

use crate::error::AppError;
use crate::services::secret::verify_secret;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Middleware that requires `Authorization: Bearer <secret>`.
pub async fn require_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let stored = state
        .config
        .stored_secret_hash
        .as_deref()
        .ok_or(AppError::SecretNotConfigured)?;

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    if !verify_secret(presented, stored) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid secret");
        return Err(AppError::InvalidSecret);
    }

    Ok(next.run(request).await)
}
