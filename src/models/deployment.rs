// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deployment results and the evaluation callback payload.

use serde::{Deserialize, Serialize};

/// Where a finished build ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

/// Body POSTed to the caller's `evaluation_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationPayload {
    pub email: String,
    pub task: String,
    pub round: i64,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}
