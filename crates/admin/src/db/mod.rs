//! Database operations for the admin panel.
//!
//! # Tables
//!
//! - `users` - Staff accounts (password login, level-based authorization)
//! - `user_groups` - Authorization groups, one per permission level
//! - `categories` - Product categories
//! - `products` - Inventory items
//! - `media` - Uploaded product photos (metadata; bytes live on disk)
//! - `sales` - Sale entries
//!
//! The session table is owned by `tower-sessions-sqlx-store` and created by
//! its own `migrate()`.
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p storeroom-cli -- migrate
//! ```

pub mod categories;
pub mod groups;
pub mod media;
pub mod products;
pub mod records;
pub mod sales;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use categories::CategoryRepository;
pub use groups::GroupRepository;
pub use media::MediaRepository;
pub use products::ProductRepository;
pub use records::{Collection, Record, RecordStore};
pub use sales::SaleRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate group name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`],
    /// leaving every other sqlx error as [`RepositoryError::Database`].
    pub(crate) fn from_sqlx(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// The database file is created if it does not exist; WAL journaling keeps
/// readers unblocked by the single writer.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string is invalid or the
/// connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::MIGRATOR;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    /// An in-memory database with the schema applied.
    ///
    /// A single connection keeps every query on the same in-memory database.
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite");
        MIGRATOR.run(&pool).await.expect("run migrations");
        pool
    }
}
