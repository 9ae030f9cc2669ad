// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task deployment service.
//!
//! Handles the core workflow:
//! 1. Generate site files from the brief via the LLM
//! 2. Add the MIT license and the Pages workflow
//! 3. Create (or reuse) the GitHub repository
//! 4. Force-push the files as one commit on `main`
//! 5. Enable GitHub Pages
//! 6. Notify the evaluation server
//! 7. Record the outcome in the task log

use crate::config::Config;
use crate::db::TaskDb;
use crate::error::Result;
use crate::models::{Deployment, EvaluationPayload, TaskRequest, TaskStatus};
use crate::services::evaluation::EvaluationNotifier;
use crate::services::git::{GitPublisher, PushTarget};
use crate::services::github::{self, GithubClient};
use crate::services::llm::LlmClient;
use crate::services::templates;
use std::sync::Arc;

/// Length of the nonce prefix used in repository names.
const NONCE_PREFIX_LEN: usize = 8;

/// Which phase of a task a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// First submission: the repository is created.
    Create,
    /// Revision: the existing repository is overwritten.
    Update,
}

impl Round {
    pub fn from_number(round: i64) -> Option<Self> {
        match round {
            1 => Some(Round::Create),
            2 => Some(Round::Update),
            _ => None,
        }
    }
}

/// Repository name for a task: `{task}-{first 8 nonce chars without dashes}`.
pub fn repo_name(task: &str, nonce: &str) -> String {
    let short: String = nonce
        .chars()
        .filter(|c| *c != '-')
        .take(NONCE_PREFIX_LEN)
        .collect();
    format!("{}-{}", task, short)
}

/// Runs deployments in the background and records their status.
pub struct Deployer {
    db: TaskDb,
    llm: LlmClient,
    github: GithubClient,
    git: GitPublisher,
    notifier: EvaluationNotifier,
}

impl Deployer {
    pub fn new(
        db: TaskDb,
        llm: LlmClient,
        github: GithubClient,
        git: GitPublisher,
        notifier: EvaluationNotifier,
    ) -> Self {
        Self {
            db,
            llm,
            github,
            git,
            notifier,
        }
    }

    pub fn from_config(config: &Config, db: TaskDb) -> Self {
        Self::new(
            db,
            LlmClient::from_config(config),
            GithubClient::from_config(config),
            GitPublisher::from_config(config),
            EvaluationNotifier::new(),
        )
    }

    /// Process a task on a background tokio task.
    pub fn spawn(self: &Arc<Self>, req: TaskRequest) -> tokio::task::JoinHandle<()> {
        let deployer = Arc::clone(self);
        tokio::spawn(async move { deployer.process_task(req).await })
    }

    /// Run a task to completion and write its final status.
    ///
    /// Unsupported rounds are logged and leave the status untouched.
    pub async fn process_task(&self, req: TaskRequest) {
        let Some(round) = Round::from_number(req.round) else {
            tracing::warn!(
                task = %req.task,
                round = req.round,
                "Unsupported round number"
            );
            return;
        };

        tracing::info!(task = %req.task, round = req.round, ?round, "Processing task");

        let status = match self.deploy(&req).await {
            Ok(deployment) => {
                tracing::info!(
                    task = %req.task,
                    round = req.round,
                    repo = %deployment.repo_url,
                    commit = %deployment.commit_sha,
                    pages = %deployment.pages_url,
                    "Task completed successfully"
                );
                TaskStatus::completed(&req.task, req.round)
            }
            Err(e) => {
                tracing::error!(
                    task = %req.task,
                    round = req.round,
                    error = %e,
                    "Task processing failed"
                );
                TaskStatus::failed(&e)
            }
        };

        if let Err(e) = self.db.update_status(&req.nonce, &status).await {
            tracing::error!(nonce = %req.nonce, error = %e, "Failed to record task status");
        }
    }

    /// Build and publish the site for a request.
    pub async fn deploy(&self, req: &TaskRequest) -> Result<Deployment> {
        let name = repo_name(&req.task, &req.nonce);
        let token = self.github.token()?;

        // 1-2. Generate files and add the fixed extras
        let mut files = self.llm.generate_files(&req.brief, &req.attachments).await?;
        files.insert(
            "LICENSE".to_string(),
            templates::mit_license_text().to_string(),
        );
        files.insert(
            templates::PAGES_WORKFLOW_PATH.to_string(),
            templates::pages_workflow().to_string(),
        );

        // 3. Repository
        let user = self.github.authenticated_user().await?;
        let repo = self.github.create_or_reuse_repo(&user.login, &name).await?;

        // 4. Push
        let target = PushTarget {
            owner: &user.login,
            repo: &repo.name,
            token,
        };
        let commit_sha = self.git.publish(&files, &target).await?;

        // 5. Pages (best effort)
        self.github.enable_pages(&user.login, &repo.name).await?;

        let deployment = Deployment {
            repo_url: repo.html_url,
            commit_sha,
            pages_url: github::pages_url(&user.login, &repo.name),
        };

        // 6. Evaluation callback
        match req.evaluation_url.as_deref() {
            Some(url) if !url.is_empty() => {
                let payload = EvaluationPayload {
                    email: req.email.clone(),
                    task: req.task.clone(),
                    round: req.round,
                    nonce: req.nonce.clone(),
                    repo_url: deployment.repo_url.clone(),
                    commit_sha: deployment.commit_sha.clone(),
                    pages_url: deployment.pages_url.clone(),
                };
                self.notifier.notify(url, &payload).await;
            }
            _ => tracing::debug!(task = %req.task, "No evaluation URL, skipping callback"),
        }

        Ok(deployment)
    }
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn request(round: i64, evaluation_url: Option<String>) -> TaskRequest {
        serde_json::from_value(json!({
            "email": "student@example.com",
            "secret": "s",
            "task": "demo",
            "round": round,
            "nonce": "ab12-cd34-ef56",
            "brief": "Show hello",
            "evaluation_url": evaluation_url,
        }))
        .unwrap()
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn repo_name_uses_dashless_nonce_prefix() {
        assert_eq!(repo_name("demo", "ab12-cd34-ef56"), "demo-ab12cd34");
        assert_eq!(repo_name("demo", "abc"), "demo-abc");
        assert_eq!(repo_name("demo", "----"), "demo-");
    }

    #[test]
    fn longest_accepted_task_fits_github_limit() {
        let req: TaskRequest = serde_json::from_value(json!({
            "email": "e", "secret": "s", "task": "a".repeat(91), "round": 1,
            "nonce": "ab12-cd34-ef56",
        }))
        .unwrap();
        assert!(validator::Validate::validate(&req).is_ok());
        assert_eq!(repo_name(&req.task, &req.nonce).len(), 100);
    }

    #[test]
    fn round_numbers() {
        assert_eq!(Round::from_number(1), Some(Round::Create));
        assert_eq!(Round::from_number(2), Some(Round::Update));
        assert_eq!(Round::from_number(0), None);
        assert_eq!(Round::from_number(3), None);
    }

    #[tokio::test]
    async fn unsupported_round_leaves_status_received() {
        let db = TaskDb::in_memory().await.unwrap();
        let req = request(3, None);
        db.insert_task(&req, "h").await.unwrap();

        let deployer = Deployer::from_config(&Config::test_default(), db.clone());
        deployer.process_task(req).await;

        let record = db.get_task("ab12-cd34-ef56").await.unwrap().unwrap();
        assert_eq!(record.status.as_deref(), Some(TaskStatus::RECEIVED));
    }

    #[tokio::test]
    async fn missing_github_token_records_failure() {
        let db = TaskDb::in_memory().await.unwrap();
        let req = request(1, None);
        db.insert_task(&req, "h").await.unwrap();

        let deployer = Deployer::from_config(&Config::test_default(), db.clone());
        deployer.process_task(req).await;

        let status = db.get_task("ab12-cd34-ef56").await.unwrap().unwrap().status.unwrap();
        assert!(status.starts_with("failed: "), "{status}");
        assert!(status.contains("GITHUB_TOKEN"), "{status}");
    }

    #[tokio::test]
    async fn llm_failure_records_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("model overloaded");
            })
            .await;

        let db = TaskDb::in_memory().await.unwrap();
        let req = request(2, None);
        db.insert_task(&req, "h").await.unwrap();

        let deployer = Deployer::new(
            db.clone(),
            LlmClient::new(server.base_url(), Some("k".into()), "m".into()),
            GithubClient::new(server.base_url(), Some("ghp".into())),
            GitPublisher::new("/nonexistent".into()),
            EvaluationNotifier::new(),
        );
        deployer.process_task(req).await;

        let status = db.get_task("ab12-cd34-ef56").await.unwrap().unwrap().status.unwrap();
        assert!(status.starts_with("failed: LLM error"), "{status}");
    }

    /// Mock the LLM and GitHub endpoints for a `demo` task owned by `octo`.
    /// Returns the Pages mock.
    async fn mock_pipeline(server: &MockServer, pages_status: u16) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"content": "<html>hello</html>"}}]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/user");
                then.status(200).json_body(json!({"login": "octo"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/user/repos")
                    .json_body_partial(r#"{"name": "demo-ab12cd34"}"#);
                then.status(201).json_body(json!({
                    "name": "demo-ab12cd34",
                    "full_name": "octo/demo-ab12cd34",
                    "html_url": "https://github.com/octo/demo-ab12cd34"
                }));
            })
            .await;
        server
            .mock_async(move |when, then| {
                when.method(POST).path("/repos/octo/demo-ab12cd34/pages");
                then.status(pages_status);
            })
            .await
    }

    /// Directory of bare remotes holding an empty `octo/demo-ab12cd34.git`.
    fn bare_remotes() -> (tempfile::TempDir, std::path::PathBuf) {
        let remotes = tempfile::tempdir().unwrap();
        let bare = remotes.path().join("octo").join("demo-ab12cd34.git");
        std::fs::create_dir_all(&bare).unwrap();
        assert!(std::process::Command::new("git")
            .args(["init", "--bare", "--quiet"])
            .current_dir(&bare)
            .status()
            .unwrap()
            .success());
        (remotes, bare)
    }

    /// Any POST other than the LLM and GitHub calls the pipeline makes.
    fn is_callback(req: &HttpMockRequest) -> bool {
        req.method == "POST"
            && !matches!(
                req.path.as_str(),
                "/chat/completions" | "/user/repos" | "/repos/octo/demo-ab12cd34/pages"
            )
    }

    fn deployer(db: &TaskDb, server: &MockServer, remotes: &std::path::Path) -> Deployer {
        Deployer::new(
            db.clone(),
            LlmClient::new(server.base_url(), Some("k".into()), "m".into()),
            GithubClient::new(server.base_url(), Some("ghp".into()))
                .with_pages_retry(2, Duration::ZERO),
            GitPublisher::new(remotes.display().to_string()),
            EvaluationNotifier::new(),
        )
    }

    async fn final_status(db: &TaskDb) -> String {
        db.get_task("ab12-cd34-ef56").await.unwrap().unwrap().status.unwrap()
    }

    #[tokio::test]
    async fn full_deployment_pushes_and_notifies() {
        if !git_available() {
            eprintln!("⚠️  Skipping: git binary not available");
            return;
        }

        let server = MockServer::start_async().await;
        let pages = mock_pipeline(&server, 201).await;
        let notify = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/notify")
                    .json_body_partial(
                        r#"{"task": "demo", "round": 1, "nonce": "ab12-cd34-ef56",
                            "repo_url": "https://github.com/octo/demo-ab12cd34",
                            "pages_url": "https://octo.github.io/demo-ab12cd34/"}"#,
                    );
                then.status(200);
            })
            .await;

        let (remotes, bare) = bare_remotes();
        let db = TaskDb::in_memory().await.unwrap();
        let req = request(1, Some(server.url("/notify")));
        db.insert_task(&req, "h").await.unwrap();

        deployer(&db, &server, remotes.path()).process_task(req).await;

        pages.assert_async().await;
        notify.assert_async().await;
        assert_eq!(final_status(&db).await, "completed: demo round 1");

        let tree = std::process::Command::new("git")
            .args(["ls-tree", "-r", "--name-only", "main"])
            .current_dir(&bare)
            .output()
            .unwrap();
        let names = String::from_utf8_lossy(&tree.stdout);
        for expected in ["index.html", "README.md", "LICENSE", ".github/workflows/pages.yml"] {
            assert!(names.lines().any(|l| l == expected), "missing {expected}: {names}");
        }

        let license = std::process::Command::new("git")
            .args(["show", "main:LICENSE"])
            .current_dir(&bare)
            .output()
            .unwrap();
        assert!(String::from_utf8_lossy(&license.stdout).contains("Permission is hereby granted"));
    }

    #[tokio::test]
    async fn deployment_without_evaluation_url_skips_callback() {
        if !git_available() {
            eprintln!("⚠️  Skipping: git binary not available");
            return;
        }

        for evaluation_url in [None, Some(String::new())] {
            let server = MockServer::start_async().await;
            mock_pipeline(&server, 201).await;
            let notify = server
                .mock_async(|when, then| {
                    when.matches(is_callback);
                    then.status(200);
                })
                .await;

            let (remotes, _bare) = bare_remotes();
            let db = TaskDb::in_memory().await.unwrap();
            let req = request(1, evaluation_url.clone());
            db.insert_task(&req, "h").await.unwrap();

            deployer(&db, &server, remotes.path()).process_task(req).await;

            assert_eq!(final_status(&db).await, "completed: demo round 1");
            notify.assert_hits_async(0).await;
        }
    }

    #[tokio::test]
    async fn pages_failure_still_completes() {
        if !git_available() {
            eprintln!("⚠️  Skipping: git binary not available");
            return;
        }

        let server = MockServer::start_async().await;
        let pages = mock_pipeline(&server, 500).await;

        let (remotes, _bare) = bare_remotes();
        let db = TaskDb::in_memory().await.unwrap();
        let req = request(1, None);
        db.insert_task(&req, "h").await.unwrap();

        deployer(&db, &server, remotes.path()).process_task(req).await;

        pages.assert_hits_async(2).await;
        assert_eq!(final_status(&db).await, "completed: demo round 1");
    }
}
