// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LLM code deployment service.
//!
//! Accepts authenticated task briefs, has an LLM write a static web app for
//! each one, and publishes the result as a GitHub repository served from
//! GitHub Pages.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::TaskDb;
use services::Deployer;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: TaskDb,
    pub deployer: Arc<Deployer>,
}
