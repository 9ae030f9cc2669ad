// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first when present, so
//! local runs and the container image share the same variable names.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port the container exposes.
pub const DEFAULT_PORT: u16 = 7860;

/// Database location used when the configured directory is not writable.
pub const FALLBACK_DB_PATH: &str = "/tmp/tasks.db";

const DEFAULT_DB_PATH: &str = "./tasks.db";
const DEFAULT_OPENAI_BASE_URL: &str = "https://aipipe.org/openai/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GIT_REMOTE_BASE: &str = "https://github.com";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Hex SHA-256 of the shared secret callers must present.
    /// When unset every task request is rejected with a 500.
    pub stored_secret_hash: Option<String>,
    /// GitHub token used for the REST API and for pushing
    pub github_token: Option<String>,
    /// Informational only; the repository owner is the token's user
    pub github_user: Option<String>,
    pub github_api_url: String,
    /// Base URL pushes go to, e.g. `https://github.com`
    pub git_remote_base: String,
    /// SQLite database file
    pub db_path: PathBuf,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub llm_model: String,
    pub pages_retry_attempts: u32,
    pub pages_retry_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self::from_lookup(|key| env::var(key).ok())?;
        Ok(Self {
            db_path: resolve_db_path(&config.db_path),
            ..config
        })
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset. The database path is taken as given;
    /// `from_env` applies the writability fallback on top.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT", v))?,
            None => DEFAULT_PORT,
        };
        let pages_retry_attempts = match get("PAGES_RETRY_ATTEMPTS") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("PAGES_RETRY_ATTEMPTS", v))?,
            None => 3,
        };
        let pages_retry_delay = match get("PAGES_RETRY_DELAY_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .map_err(|_| ConfigError::Invalid("PAGES_RETRY_DELAY_SECS", v))?,
            ),
            None => Duration::from_secs(5),
        };

        Ok(Self {
            port,
            stored_secret_hash: get("STORED_SECRET_HASH").map(|h| h.to_lowercase()),
            github_token: get("GITHUB_TOKEN"),
            github_user: get("GITHUB_USER"),
            github_api_url: get("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            git_remote_base: get("GIT_REMOTE_BASE")
                .unwrap_or_else(|| DEFAULT_GIT_REMOTE_BASE.to_string()),
            db_path: PathBuf::from(get("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string())),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_api_key: get("OPENAI_API_KEY").or_else(|| get("AIPIPE_TOKEN")),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            pages_retry_attempts,
            pages_retry_delay,
        })
    }

    /// Config for tests: secret `test-secret`, no external credentials,
    /// in-process database and no retry delay.
    pub fn test_default() -> Self {
        Self {
            port: DEFAULT_PORT,
            stored_secret_hash: Some(crate::services::secret::hash_secret("test-secret")),
            github_token: None,
            github_user: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            git_remote_base: DEFAULT_GIT_REMOTE_BASE.to_string(),
            db_path: PathBuf::from(":memory:"),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            pages_retry_attempts: 3,
            pages_retry_delay: Duration::ZERO,
        }
    }
}

/// Return `path` if its directory can be created and written to,
/// otherwise [`FALLBACK_DB_PATH`].
pub fn resolve_db_path(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let probe = dir.join(".db_write_test");
    let writable = std::fs::create_dir_all(&dir)
        .and_then(|_| std::fs::write(&probe, b""))
        .is_ok();

    if writable {
        let _ = std::fs::remove_file(&probe);
        path.to_path_buf()
    } else {
        tracing::warn!(
            requested = %path.display(),
            fallback = FALLBACK_DB_PATH,
            "Database directory not writable, falling back"
        );
        PathBuf::from(FALLBACK_DB_PATH)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
