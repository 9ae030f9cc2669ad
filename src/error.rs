// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Server secret not configured")]
    SecretNotConfigured,

    #[error("Invalid secret")]
    InvalidSecret,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("GitHub API error: {0}")]
    Github(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker GitHub puts in 422 responses when a repository name is taken.
    pub const NAME_EXISTS: &'static str = "name already exists";

    /// Check if this is GitHub refusing to create a repository that already exists.
    pub fn is_name_conflict(&self) -> bool {
        match self {
            AppError::Github(msg) => {
                msg.starts_with("HTTP 422") && msg.to_lowercase().contains(Self::NAME_EXISTS)
            }
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::SecretNotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "secret_not_configured",
                Some(self.to_string()),
            ),
            AppError::InvalidSecret => (
                StatusCode::FORBIDDEN,
                "invalid_secret",
                Some(self.to_string()),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Llm(msg) => (StatusCode::BAD_GATEWAY, "llm_error", Some(msg.clone())),
            AppError::Github(msg) => {
                (StatusCode::BAD_GATEWAY, "github_error", Some(msg.clone()))
            }
            AppError::Git(msg) => {
                tracing::error!(error = %msg, "Git error");
                (StatusCode::INTERNAL_SERVER_ERROR, "git_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
