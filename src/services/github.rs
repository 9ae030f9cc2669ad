// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub REST client for repository and Pages management.
//!
//! Handles:
//! - Resolving the token's user (the repository owner)
//! - Creating public repositories, reusing ones that already exist
//! - Enabling Pages with bounded retries

use crate::config::Config;
use crate::error::AppError;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("llm-code-deploy/", env!("CARGO_PKG_VERSION"));
const REPO_DESCRIPTION: &str = "Auto-generated repo for LLM code deployment";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Authenticated GitHub user.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub login: String,
}

/// Subset of the repository resource we use.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
}

/// Result of trying to switch on GitHub Pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagesOutcome {
    Enabled,
    AlreadyEnabled,
    Failed,
}

/// GitHub API client.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    pages_attempts: u32,
    pages_delay: Duration,
}

impl GithubClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            pages_attempts: 3,
            pages_delay: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.github_api_url.clone(), config.github_token.clone())
            .with_pages_retry(config.pages_retry_attempts, config.pages_retry_delay)
    }

    /// Override how often and how patiently Pages enablement is retried.
    pub fn with_pages_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.pages_attempts = attempts.max(1);
        self.pages_delay = delay;
        self
    }

    /// The configured token, or an error if none is set.
    pub fn token(&self) -> Result<&str, AppError> {
        self.token
            .as_deref()
            .ok_or_else(|| AppError::Github("GITHUB_TOKEN not set".to_string()))
    }

    /// Get the user the token belongs to.
    pub async fn authenticated_user(&self) -> Result<GithubUser, AppError> {
        let response = self
            .request(reqwest::Method::GET, "/user")?
            .send()
            .await
            .map_err(|e| AppError::Github(e.to_string()))?;

        let user: GithubUser = self.check_response_json(response).await?;
        tracing::info!(login = %user.login, "Authenticated with GitHub");
        Ok(user)
    }

    /// Create a public repository, or reuse it if the name is already taken.
    pub async fn create_or_reuse_repo(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Repository, AppError> {
        match self.create_repo(name).await {
            Ok(repo) => {
                tracing::info!(url = %repo.html_url, "Created new repository");
                Ok(repo)
            }
            Err(e) if e.is_name_conflict() => {
                tracing::info!(repo = name, "Repository already exists, reusing it");
                self.get_repo(owner, name).await
            }
            Err(e) => {
                tracing::error!(repo = name, error = %e, "Repository creation failed");
                Err(e)
            }
        }
    }

    async fn create_repo(&self, name: &str) -> Result<Repository, AppError> {
        let body = serde_json::json!({
            "name": name,
            "description": REPO_DESCRIPTION,
            "private": false,
        });

        let response = self
            .request(reqwest::Method::POST, "/user/repos")?
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Github(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Fetch an existing repository.
    pub async fn get_repo(&self, owner: &str, name: &str) -> Result<Repository, AppError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/repos/{}/{}", owner, name))?
            .send()
            .await
            .map_err(|e| AppError::Github(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Repository {}/{}", owner, name)));
        }
        self.check_response_json(response).await
    }

    /// Turn on Pages for the `main` branch root.
    ///
    /// Transient failures are retried; giving up is reported as
    /// [`PagesOutcome::Failed`] rather than an error since the push itself
    /// already succeeded.
    pub async fn enable_pages(&self, owner: &str, repo: &str) -> Result<PagesOutcome, AppError> {
        let path = format!("/repos/{}/{}/pages", owner, repo);
        let body = serde_json::json!({"source": {"branch": "main", "path": "/"}});

        for attempt in 1..=self.pages_attempts {
            let result = self
                .request(reqwest::Method::POST, &path)?
                .json(&body)
                .send()
                .await;

            match result {
                Ok(r) if matches!(r.status(), StatusCode::CREATED | StatusCode::NO_CONTENT) => {
                    tracing::info!(attempt, repo, "Pages enabled");
                    return Ok(PagesOutcome::Enabled);
                }
                Ok(r) if r.status() == StatusCode::CONFLICT => {
                    tracing::info!(repo, "Pages already enabled");
                    return Ok(PagesOutcome::AlreadyEnabled);
                }
                Ok(r) => {
                    let status = r.status();
                    let text = r.text().await.unwrap_or_default();
                    tracing::warn!(attempt, status = %status, body = %text, "Pages enablement failed");
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Pages enablement request failed");
                }
            }

            if attempt < self.pages_attempts {
                tokio::time::sleep(self.pages_delay).await;
            }
        }

        tracing::error!(
            repo,
            attempts = self.pages_attempts,
            "Could not enable GitHub Pages"
        );
        Ok(PagesOutcome::Failed)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        let token = self.token()?;
        Ok(self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Github(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Github(format!("JSON parse error: {}", e)))
    }
}

/// Public URL a Pages site is served from.
pub fn pages_url(owner: &str, repo: &str) -> String {
    format!("https://{}.github.io/{}/", owner, repo)
}
