//! Application setup and initialization
//!
//! Initialization logic extracted from main.rs for better organization
//! and testability.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::state::AppState;
use wovenmusic_core::Config;
use wovenmusic_storage::BucketSet;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();

    tracing::info!(
        environment = %config.environment,
        storage_backend = ?config.storage_backend,
        "Configuration loaded and validated"
    );

    let pool = database::setup_database(&config).await?;

    let buckets = BucketSet::from_config(&config)
        .await
        .context("Failed to initialize storage buckets")?;

    let state = Arc::new(AppState::new(config.clone(), pool, buckets));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
