//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AdminConfig;
use crate::services::MediaStorage;

/// Application state shared across all handlers.
///
/// Cheap to clone; the inner data lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: SqlitePool,
    media: MediaStorage,
}

impl AppState {
    /// Build the state from configuration and a connection pool.
    #[must_use]
    pub fn new(config: AdminConfig, pool: SqlitePool) -> Self {
        let media = MediaStorage::new(config.upload_dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
            }),
        }
    }

    /// The application configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Filesystem storage for uploaded media.
    #[must_use]
    pub fn media(&self) -> &MediaStorage {
        &self.inner.media
    }
}
