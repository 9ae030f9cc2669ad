// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task request and storage models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// File shipped alongside a task brief, usually as a data URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default = "unknown_name")]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

fn unknown_name() -> String {
    "unknown".to_string()
}

/// Incoming build-and-deploy request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskRequest {
    pub email: String,
    pub secret: String,
    /// Becomes the prefix of the repository name. GitHub allows 100
    /// characters and `-{8 nonce chars}` is appended, leaving 91.
    #[validate(length(min = 1, max = 91), custom(function = "validate_task_name"))]
    pub task: String,
    pub round: i64,
    /// Its first dash-free characters end the repository name.
    #[validate(length(min = 1), custom(function = "validate_nonce"))]
    pub nonce: String,
    #[serde(default)]
    pub brief: String,
    /// Evaluation checks; accepted but not used by the build.
    #[serde(default)]
    pub checks: Vec<serde_json::Value>,
    #[serde(default)]
    pub evaluation_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// GitHub repository names allow ASCII alphanumerics, `-`, `_` and `.`.
fn validate_task_name(task: &str) -> Result<(), ValidationError> {
    let valid = task
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("task_name")
            .with_message("task may only contain letters, digits, '-', '_' and '.'".into()))
    }
}

/// Nonces are ASCII alphanumerics and dashes, with at least one non-dash.
fn validate_nonce(nonce: &str) -> Result<(), ValidationError> {
    let charset_ok = nonce.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if charset_ok && nonce.chars().any(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::new("nonce")
            .with_message("nonce may only contain letters, digits and '-'".into()))
    }
}

/// Response returned as soon as a task is queued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAccepted {
    pub status: String,
    pub task: String,
    pub round: i64,
    pub nonce: String,
}

impl TaskAccepted {
    pub fn for_request(req: &TaskRequest) -> Self {
        Self {
            status: "accepted".to_string(),
            task: req.task.clone(),
            round: req.round,
            nonce: req.nonce.clone(),
        }
    }
}

/// Full row of the `tasks` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskRecord {
    pub id: i64,
    pub email: Option<String>,
    pub task: Option<String>,
    pub round: Option<i64>,
    pub nonce: Option<String>,
    #[serde(skip_serializing)]
    pub secret_hash: Option<String>,
    pub brief: Option<String>,
    pub evaluation_url: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Projection used when listing tasks.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskSummary {
    pub id: i64,
    pub email: Option<String>,
    pub task: Option<String>,
    pub round: Option<i64>,
    pub nonce: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Status strings written to the `status` column.
pub struct TaskStatus;

impl TaskStatus {
    pub const RECEIVED: &'static str = "received";

    pub fn completed(task: &str, round: i64) -> String {
        format!("completed: {} round {}", task, round)
    }

    pub fn failed(reason: impl std::fmt::Display) -> String {
        format!("failed: {}", reason)
    }
}
