// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LLM Code Deployment API Server
//!
//! Receives task briefs, generates static web apps with an LLM and
//! publishes them to GitHub Pages.

use llm_code_deploy::{config::Config, db::TaskDb, services::Deployer, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting LLM Code Deployment API");

    if config.stored_secret_hash.is_none() {
        tracing::warn!("STORED_SECRET_HASH not set; all task requests will be rejected");
    }
    if config.github_token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set; deployments will fail");
    }
    if config.openai_api_key.is_none() {
        tracing::warn!("AIPIPE_TOKEN or OPENAI_API_KEY not set; deployments will fail");
    }

    // Initialize SQLite task log
    let db = TaskDb::connect(&config.db_path).await?;

    let deployer = Arc::new(Deployer::from_config(&config, db.clone()));
    tracing::info!(model = %config.llm_model, "Deployment service initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        deployer,
    });

    // Build router
    let app = llm_code_deploy::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging. `RUST_LOG` overrides the defaults.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("llm_code_deploy=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
