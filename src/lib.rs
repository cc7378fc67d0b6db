//! Codevault
//!
//! Issues, redeems and tracks activation codes:
//! - Batch generation with optional prefix, usage limit and expiry
//! - Atomic redemption with validity checks
//! - Listing, search, statistics and CSV/QR export
//! - API-key gated programmatic generation

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use api::state::AppState;
use crate::config::StorageBackend;
use domain::DomainError;
use infrastructure::{
    activation_code::{InMemoryActivationCodeRepository, PostgresActivationCodeRepository},
    api_key::{InMemoryApiKeyRepository, PostgresApiKeyRepository},
    storage::{run_schema_migrations, PostgresConfig},
};
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    info!("Storage backend: {:?}", config.storage.backend);

    let state = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            AppState::from_repositories(
                Arc::new(InMemoryActivationCodeRepository::new()),
                Arc::new(InMemoryApiKeyRepository::new()),
            )
        }
        StorageBackend::Postgres => {
            let database_url = config.storage.resolve_database_url().ok_or_else(|| {
                DomainError::configuration(
                    "storage.database_url or DATABASE_URL is required for the postgres backend",
                )
            })?;

            info!("Connecting to PostgreSQL...");
            let pool = PostgresConfig::new(database_url)
                .with_max_connections(config.storage.max_connections)
                .connect()
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!("PostgreSQL connection established");

            run_schema_migrations(&pool)
                .await
                .context("Failed to apply schema migrations")?;

            AppState::from_repositories(
                Arc::new(PostgresActivationCodeRepository::new(pool.clone())),
                Arc::new(PostgresApiKeyRepository::new(pool)),
            )
        }
    };

    Ok(state)
}
