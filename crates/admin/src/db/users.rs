//! Staff account repository.

use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

use storeroom_core::{Level, Status, UserId};

use super::RepositoryError;
use crate::models::{User, UserWithGroup};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    username: String,
    password_hash: String,
    user_level: i64,
    image: String,
    status: i64,
    last_login: Option<NaiveDateTime>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            username: row.username,
            password_hash: row.password_hash,
            level: Level::new(row.user_level),
            image: row.image,
            status: Status::from_flag(row.status),
            last_login: row.last_login,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithGroupRow {
    id: i64,
    name: String,
    username: String,
    user_level: i64,
    status: i64,
    last_login: Option<NaiveDateTime>,
    group_name: Option<String>,
}

impl From<UserWithGroupRow> for UserWithGroup {
    fn from(row: UserWithGroupRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            username: row.username,
            level: Level::new(row.user_level),
            status: Status::from_flag(row.status),
            last_login: row.last_login,
            group_name: row.group_name,
        }
    }
}

const USER_COLUMNS: &str =
    "id, name, username, password_hash, user_level, image, status, last_login";

/// Repository for staff account database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id.as_i64())
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    /// Get a user by their login name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// List all users joined with their group names, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_groups(&self) -> Result<Vec<UserWithGroup>, RepositoryError> {
        let rows: Vec<UserWithGroupRow> = sqlx::query_as(
            "SELECT u.id, u.name, u.username, u.user_level, u.status, u.last_login, \
                    g.group_name \
             FROM users u \
             LEFT JOIN user_groups g ON g.group_level = u.user_level \
             ORDER BY u.name ASC",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        username: &str,
        password_hash: &str,
        level: Level,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (name, username, password_hash, user_level) \
             VALUES (?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(username)
        .bind(password_hash)
        .bind(level.as_i64())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "username already exists"))?;
        Ok(row.into())
    }

    /// Update an account's name, username, level and status (admin edit).
    ///
    /// Returns `true` iff exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a username collision.
    /// Returns `RepositoryError::Database` otherwise.
    pub async fn update(
        &self,
        id: UserId,
        name: &str,
        username: &str,
        level: Level,
        status: Status,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET name = ?, username = ?, user_level = ?, status = ? WHERE id = ?",
        )
        .bind(name)
        .bind(username)
        .bind(level.as_i64())
        .bind(status.as_flag())
        .bind(id.as_i64())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "username already exists"))?;
        Ok(result.rows_affected() == 1)
    }

    /// Update an account's own name and username (profile edit).
    ///
    /// Returns `true` iff exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a username collision.
    /// Returns `RepositoryError::Database` otherwise.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        username: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE users SET name = ?, username = ? WHERE id = ?")
            .bind(name)
            .bind(username)
            .bind(id.as_i64())
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(e, "username already exists"))?;
        Ok(result.rows_affected() == 1)
    }

    /// Replace an account's credential hash.
    ///
    /// Returns `true` iff exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Stamp the account's last successful sign-in with the current time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn update_last_login(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now().naive_utc())
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
    async fn test_create_and_find_by_username() {
        let pool = memory_pool().await;
        let repo = UserRepository::new(&pool);

        let user = repo
            .create("Pat Jones", "pat", "hash", Level::USER)
            .await
            .expect("create user");
        assert_eq!(user.username, "pat");
        assert_eq!(user.status, Status::Active);
        assert!(user.last_login.is_none());

        let found = repo
            .find_by_username("pat")
            .await
            .expect("query ok")
            .expect("user present");
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let pool = memory_pool().await;
        let repo = UserRepository::new(&pool);
        repo.create("Pat", "pat", "hash", Level::USER)
            .await
            .expect("create user");
        let err = repo
            .create("Other Pat", "pat", "hash", Level::USER)
            .await
            .expect_err("duplicate username must fail");
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_with_groups_joins_on_level() {
        let pool = memory_pool().await;
        sqlx::query(
            "INSERT INTO user_groups (group_name, group_level, group_status) VALUES ('Admin', 1, 1)",
        )
        .execute(&pool)
        .await
        .expect("insert group");

        let repo = UserRepository::new(&pool);
        repo.create("Alex", "alex", "hash", Level::ADMIN)
            .await
            .expect("create admin");
        repo.create("Uma", "uma", "hash", Level::new(7))
            .await
            .expect("create ungrouped");

        let users = repo.list_with_groups().await.expect("list");
        assert_eq!(users.len(), 2);
        let alex = users.iter().find(|u| u.username == "alex").expect("alex");
        assert_eq!(alex.group_name.as_deref(), Some("Admin"));
        let uma = users.iter().find(|u| u.username == "uma").expect("uma");
        assert!(uma.group_name.is_none());
    }

    #[tokio::test]
    async fn test_update_last_login_sets_timestamp() {
        let pool = memory_pool().await;
        let repo = UserRepository::new(&pool);
        let user = repo
            .create("Pat", "pat", "hash", Level::USER)
            .await
            .expect("create user");

        assert!(repo.update_last_login(user.id).await.expect("update"));
        let reread = repo
            .find_by_id(user.id)
            .await
            .expect("query ok")
            .expect("user present");
        assert!(reread.last_login.is_some());
    }
}
