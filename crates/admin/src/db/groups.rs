//! User group repository.
//!
//! Group name and level are both unique. The flows check for duplicates
//! first so the user gets a readable message, and the schema's UNIQUE
//! constraints close the window between check and insert; a constraint hit
//! surfaces as [`RepositoryError::Conflict`].

use sqlx::SqlitePool;

use storeroom_core::{GroupId, Level, Status};

use super::RepositoryError;
use crate::models::Group;

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: i64,
    group_name: String,
    group_level: i64,
    group_status: i64,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: GroupId::new(row.id),
            name: row.group_name,
            level: Level::new(row.group_level),
            status: Status::from_flag(row.group_status),
        }
    }
}

const GROUP_COLUMNS: &str = "id, group_name, group_level, group_status";

/// Repository for user group database operations.
pub struct GroupRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GroupRepository<'a> {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all groups, strongest level first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Group>, RepositoryError> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!(
            "SELECT {GROUP_COLUMNS} FROM user_groups ORDER BY group_level ASC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a group by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        let row: Option<GroupRow> =
            sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM user_groups WHERE id = ?"))
                .bind(id.as_i64())
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    /// Get a group by its display name (duplicate check before insert).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Group>, RepositoryError> {
        let row: Option<GroupRow> = sqlx::query_as(&format!(
            "SELECT {GROUP_COLUMNS} FROM user_groups WHERE group_name = ? LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Get a group by its numeric level.
    ///
    /// Used both as the duplicate check before insert and by the permission
    /// gate to find the group governing a user's level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_level(&self, level: Level) -> Result<Option<Group>, RepositoryError> {
        let row: Option<GroupRow> = sqlx::query_as(&format!(
            "SELECT {GROUP_COLUMNS} FROM user_groups WHERE group_level = ? LIMIT 1"
        ))
        .bind(level.as_i64())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Create a new group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or level is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        level: Level,
        status: Status,
    ) -> Result<Group, RepositoryError> {
        let row: GroupRow = sqlx::query_as(&format!(
            "INSERT INTO user_groups (group_name, group_level, group_status) \
             VALUES (?, ?, ?) RETURNING {GROUP_COLUMNS}"
        ))
        .bind(name)
        .bind(level.as_i64())
        .bind(status.as_flag())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "group name or level already exists"))?;
        Ok(row.into())
    }

    /// Update a group's name, level and status.
    ///
    /// Returns `true` iff exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new name or level collides
    /// with another group. Returns `RepositoryError::Database` otherwise.
    pub async fn update(
        &self,
        id: GroupId,
        name: &str,
        level: Level,
        status: Status,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE user_groups SET group_name = ?, group_level = ?, group_status = ? WHERE id = ?",
        )
        .bind(name)
        .bind(level.as_i64())
        .bind(status.as_flag())
        .bind(id.as_i64())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "group name or level already exists"))?;
        Ok(result.rows_affected() == 1)
    }

    /// Number of user accounts whose level is governed by this group.
    ///
    /// A group with members must not be deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn member_count(&self, level: Level) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM users WHERE user_level = ?")
            .bind(level.as_i64())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = memory_pool().await;
        let repo = GroupRepository::new(&pool);

        let group = repo
            .create("Managers", Level::new(2), Status::Active)
            .await
            .expect("create group");
        assert_eq!(group.name, "Managers");
        assert_eq!(group.level, Level::new(2));

        let by_name = repo
            .find_by_name("Managers")
            .await
            .expect("query ok")
            .expect("group present");
        assert_eq!(by_name.id, group.id);

        let by_level = repo
            .find_by_level(Level::new(2))
            .await
            .expect("query ok")
            .expect("group present");
        assert_eq!(by_level.id, group.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let pool = memory_pool().await;
        let repo = GroupRepository::new(&pool);

        repo.create("Managers", Level::new(2), Status::Active)
            .await
            .expect("create group");
        let err = repo
            .create("Managers", Level::new(3), Status::Active)
            .await
            .expect_err("duplicate name must fail");
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_level_is_conflict() {
        let pool = memory_pool().await;
        let repo = GroupRepository::new(&pool);

        repo.create("Managers", Level::new(2), Status::Active)
            .await
            .expect("create group");
        let err = repo
            .create("Clerks", Level::new(2), Status::Active)
            .await
            .expect_err("duplicate level must fail");
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_group_is_false() {
        let pool = memory_pool().await;
        let repo = GroupRepository::new(&pool);
        let changed = repo
            .update(GroupId::new(99), "Ghost", Level::new(9), Status::Active)
            .await
            .expect("update ok");
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_member_count() {
        let pool = memory_pool().await;
        let repo = GroupRepository::new(&pool);
        repo.create("Clerks", Level::new(3), Status::Active)
            .await
            .expect("create group");
        assert_eq!(repo.member_count(Level::new(3)).await.expect("count"), 0);

        sqlx::query(
            "INSERT INTO users (name, username, password_hash, user_level) \
             VALUES ('Pat', 'pat', 'x', 3)",
        )
        .execute(&pool)
        .await
        .expect("insert user");
        assert_eq!(repo.member_count(Level::new(3)).await.expect("count"), 1);
    }
}
