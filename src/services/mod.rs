// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod data_uri;
pub mod deploy;
pub mod evaluation;
pub mod git;
pub mod github;
pub mod llm;
pub mod secret;
pub mod templates;

pub use deploy::Deployer;
pub use evaluation::EvaluationNotifier;
pub use git::GitPublisher;
pub use github::GithubClient;
pub use llm::LlmClient;
