// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite task log.
//!
//! Every accepted request is appended as a row; the background deployment
//! later rewrites the `status` column of all rows sharing its nonce.

use crate::error::AppError;
use crate::models::{TaskRecord, TaskRequest, TaskStatus, TaskSummary};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 5;

/// Task database handle. Cheap to clone.
#[derive(Clone)]
pub struct TaskDb {
    pool: SqlitePool,
}

impl TaskDb {
    /// Open (creating if needed) the database file and ensure the schema exists.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", path.display(), e)))?;

        let db = Self { pool };
        db.init_schema().await?;

        tracing::info!(path = %path.display(), "Connected to SQLite");
        Ok(db)
    }

    /// Private in-memory database for tests.
    ///
    /// A single long-lived connection is used because each SQLite
    /// connection to `:memory:` gets its own database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                email TEXT,
                task TEXT,
                round INTEGER,
                nonce TEXT,
                secret_hash TEXT,
                brief TEXT,
                evaluation_url TEXT,
                status TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ─── Task Operations ─────────────────────────────────────────

    /// Record a newly received task. Returns the row id.
    pub async fn insert_task(&self, req: &TaskRequest, secret_hash: &str) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (
                email, task, round, nonce, secret_hash, brief, evaluation_url, status
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&req.email)
        .bind(&req.task)
        .bind(req.round)
        .bind(&req.nonce)
        .bind(secret_hash)
        .bind(&req.brief)
        .bind(&req.evaluation_url)
        .bind(TaskStatus::RECEIVED)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Set the status of every row with this nonce. Returns rows touched.
    pub async fn update_status(&self, nonce: &str, status: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE tasks SET status = ?1 WHERE nonce = ?2")
            .bind(status)
            .bind(nonce)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// All tasks, newest first.
    pub async fn list_tasks(&self) -> Result<Vec<TaskSummary>, AppError> {
        let rows = sqlx::query_as::<_, TaskSummary>(
            r#"
            SELECT id, email, task, round, nonce, status, created_at
            FROM tasks
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent row for a nonce.
    pub async fn get_task(&self, nonce: &str) -> Result<Option<TaskRecord>, AppError> {
        let row = sqlx::query_as::<_, TaskRecord>(
            r#"
            SELECT id, email, task, round, nonce, secret_hash, brief,
                   evaluation_url, status, created_at
            FROM tasks
            WHERE nonce = ?1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(nonce)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
