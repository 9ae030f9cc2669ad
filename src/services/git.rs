// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Publishes a generated file set as a single commit using the `git` CLI.
//!
//! Each publish works in a fresh temporary checkout that is removed when
//! the push finishes. The remote branch is force-pushed, so a repository
//! always holds exactly the latest generated snapshot.

use crate::config::Config;
use crate::error::AppError;
use crate::services::llm::GeneratedFiles;
use anyhow::Context;
use std::path::{Component, Path, PathBuf};
use tokio::process::Command;

const COMMIT_MESSAGE: &str = "Automated deployment";
const BRANCH: &str = "main";

/// Identity and credentials for one push.
#[derive(Debug, Clone)]
pub struct PushTarget<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub token: &'a str,
}

/// Writes files into a scratch repository and pushes them.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    remote_base: String,
}

impl GitPublisher {
    /// `remote_base` is either an `http(s)://` host such as
    /// `https://github.com` or a local directory holding bare repositories.
    pub fn new(remote_base: String) -> Self {
        Self {
            remote_base: remote_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.git_remote_base.clone())
    }

    /// Remote URL for a target, with the token embedded for http(s) hosts.
    pub fn remote_url(&self, target: &PushTarget<'_>) -> String {
        let base = &self.remote_base;
        for scheme in ["https://", "http://"] {
            if let Some(host) = base.strip_prefix(scheme) {
                return format!(
                    "{}{}@{}/{}/{}.git",
                    scheme, target.token, host, target.owner, target.repo
                );
            }
        }
        format!("{}/{}/{}.git", base, target.owner, target.repo)
    }

    /// Commit `files` and force-push them to `main`. Returns the commit SHA.
    pub async fn publish(
        &self,
        files: &GeneratedFiles,
        target: &PushTarget<'_>,
    ) -> Result<String, AppError> {
        let workdir = tempfile::tempdir().context("Failed to create temp dir")?;
        let dir = workdir.path();

        write_files(dir, files).await?;

        let email = format!("{}@users.noreply.github.com", target.owner);
        let remote = self.remote_url(target);
        let git = GitRunner {
            dir,
            secret: target.token,
        };

        git.run(&["init"]).await?;
        git.run(&["config", "--local", "user.name", target.owner])
            .await?;
        git.run(&["config", "--local", "user.email", email.as_str()]).await?;
        tracing::debug!(owner = target.owner, email = %email, "Configured local git identity");

        git.run(&["add", "."]).await?;
        git.run(&["commit", "-m", COMMIT_MESSAGE]).await?;
        git.run(&["branch", "-M", BRANCH]).await?;
        git.run(&["remote", "add", "origin", remote.as_str()]).await?;
        git.run(&["push", "-u", "origin", BRANCH, "--force"]).await?;

        let sha = git.run(&["rev-parse", "HEAD"]).await?;
        tracing::info!(
            commit = %sha,
            remote = %redact(&remote, target.token),
            files = files.len(),
            "Pushed generated files"
        );
        Ok(sha)
    }
}

struct GitRunner<'a> {
    dir: &'a Path,
    secret: &'a str,
}

impl GitRunner<'_> {
    async fn run(&self, args: &[&str]) -> Result<String, AppError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir)
            .env("HOME", self.dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .await
            .map_err(|e| AppError::Git(format!("Failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Git(format!(
                "git {} failed ({}): {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                redact(stderr.trim(), self.secret)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Write every file below `root`, creating parent directories.
async fn write_files(root: &Path, files: &GeneratedFiles) -> Result<(), AppError> {
    for (name, content) in files {
        let path = safe_join(root, name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", name))?;
    }
    Ok(())
}

/// Join a repository-relative path, refusing anything that escapes `root`.
fn safe_join(root: &Path, name: &str) -> Result<PathBuf, AppError> {
    let relative = Path::new(name);
    let escapes = name.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if escapes {
        return Err(AppError::Git(format!("Refusing to write file {:?}", name)));
    }
    Ok(root.join(relative))
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, "***")
    }
}
