// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod deployment;
pub mod task;

pub use deployment::{Deployment, EvaluationPayload};
pub use task::{Attachment, TaskAccepted, TaskRecord, TaskRequest, TaskStatus, TaskSummary};
