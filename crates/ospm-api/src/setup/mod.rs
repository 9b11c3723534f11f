//! Application setup and initialization
//!
//! Picks the store backend from the configuration and builds the router on top
//! of it. Everything after store selection is backend independent.

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use axum::Router;
use ospm_core::{Config, StoreBackend};
use ospm_db::{MemoryStore, PgStore};

/// Initialize the entire application
pub async fn initialize_app(config: &Config) -> Result<Router> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(&config.environment)?;

    tracing::info!(
        store_backend = %config.store_backend,
        "Configuration loaded and validated successfully"
    );

    let router = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = database::setup_database(config).await?;
            routes::setup_routes(AppState::new(PgStore::new(pool), config))?
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data will not survive a restart");
            routes::setup_routes(AppState::new(MemoryStore::new(), config))?
        }
    };

    Ok(router)
}
