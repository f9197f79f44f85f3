//! Uploaded media repository.

use sqlx::SqlitePool;

use storeroom_core::MediaId;

use super::RepositoryError;
use crate::models::Media;

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: i64,
    file_name: String,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Self {
            id: MediaId::new(row.id),
            file_name: row.file_name,
        }
    }
}

/// Repository for media metadata database operations.
pub struct MediaRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MediaRepository<'a> {
    /// Create a new media repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all uploads, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Media>, RepositoryError> {
        let rows: Vec<MediaRow> =
            sqlx::query_as("SELECT id, file_name FROM media ORDER BY id DESC")
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an upload by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: MediaId) -> Result<Option<Media>, RepositoryError> {
        let row: Option<MediaRow> = sqlx::query_as("SELECT id, file_name FROM media WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Record an upload's stored file name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn create(&self, file_name: &str) -> Result<Media, RepositoryError> {
        let row: MediaRow =
            sqlx::query_as("INSERT INTO media (file_name) VALUES (?) RETURNING id, file_name")
                .bind(file_name)
                .fetch_one(self.pool)
                .await?;
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let pool = memory_pool().await;
        let repo = MediaRepository::new(&pool);
        repo.create("a1b2c3d4.png").await.expect("create");
        repo.create("e5f6a7b8.jpg").await.expect("create");

        let all = repo.list_all().await.expect("list");
        let names: Vec<&str> = all.iter().map(|m| m.file_name.as_str()).collect();
        assert_eq!(names, vec!["e5f6a7b8.jpg", "a1b2c3d4.png"]);
    }
}
