//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use sqlx::SqlitePool;
use thiserror::Error;

use storeroom_admin::config::{AdminConfig, ConfigError};
use storeroom_admin::db::{self, RepositoryError};
use storeroom_admin::services::AuthError;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("price error: {0}")]
    Price(#[from] storeroom_core::PriceError),
}

/// Connect to the configured database.
pub async fn connect() -> Result<SqlitePool, CommandError> {
    let config = AdminConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    Ok(pool)
}
