// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Callback to the evaluation server once a deployment is live.

use crate::models::EvaluationPayload;
use std::time::Duration;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to a callback. Callbacks never fail the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered(u16),
    Rejected(u16),
    Failed,
}

#[derive(Clone)]
pub struct EvaluationNotifier {
    http: reqwest::Client,
}

impl Default for EvaluationNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationNotifier {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// POST the payload as JSON to `url`, logging the outcome.
    pub async fn notify(&self, url: &str, payload: &EvaluationPayload) -> NotifyOutcome {
        match self.http.post(url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                let status = response.status().as_u16();
                tracing::info!(url, status, nonce = %payload.nonce, "Evaluation callback delivered");
                NotifyOutcome::Delivered(status)
            }
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::warn!(url, status, nonce = %payload.nonce, "Evaluation callback rejected");
                NotifyOutcome::Rejected(status)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Evaluation callback failed");
                NotifyOutcome::Failed
            }
        }
    }
}
