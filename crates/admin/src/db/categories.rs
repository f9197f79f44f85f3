//! Product category repository.

use sqlx::SqlitePool;

use storeroom_core::CategoryId;

use super::RepositoryError;
use crate::models::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name FROM categories ORDER BY name ASC")
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as("SELECT id, name FROM categories WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Get a category by its name (duplicate check before insert).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name FROM categories WHERE name = ? LIMIT 1")
                .bind(name)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    /// Create a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn create(&self, name: &str) -> Result<Category, RepositoryError> {
        let row: CategoryRow =
            sqlx::query_as("INSERT INTO categories (name) VALUES (?) RETURNING id, name")
                .bind(name)
                .fetch_one(self.pool)
                .await?;
        Ok(row.into())
    }

    /// Rename a category.
    ///
    /// Returns `true` iff exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn update(&self, id: CategoryId, name: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE categories SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    #[tokio::test]
    async fn test_create_list_update() {
        let pool = memory_pool().await;
        let repo = CategoryRepository::new(&pool);

        let snacks = repo.create("Snacks").await.expect("create");
        repo.create("Drinks").await.expect("create");

        let all = repo.list_all().await.expect("list");
        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Drinks", "Snacks"]);

        assert!(repo.update(snacks.id, "Sweets").await.expect("update"));
        let renamed = repo
            .find_by_id(snacks.id)
            .await
            .expect("query ok")
            .expect("present");
        assert_eq!(renamed.name, "Sweets");
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let pool = memory_pool().await;
        let repo = CategoryRepository::new(&pool);
        repo.create("Drinks").await.expect("create");

        assert!(repo.find_by_name("Drinks").await.expect("query ok").is_some());
        assert!(repo.find_by_name("Tools").await.expect("query ok").is_none());
    }
}
