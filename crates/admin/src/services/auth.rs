//! Password authentication service.
//!
//! Credentials are argon2 PHC strings. Authentication failures are folded
//! into a single `InvalidCredentials` answer so the login page cannot be
//! used to probe which usernames exist; a disabled account is reported the
//! same way.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username, wrong password, or disabled account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Credential hashing failed.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// Database failure while loading the account.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Hash a password into an argon2 PHC string.
///
/// # Errors
///
/// Returns [`AuthError::Hash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
///
/// An unparseable stored hash verifies as `false`; it is a data problem,
/// not a reason to 500 the login page.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Password authentication over the user repository.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Authenticate a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown username,
    /// wrong password, or disabled account; [`AuthError::Repository`] for
    /// infrastructure failures.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.status.is_active() {
            return Err(AuthError::InvalidCredentials);
        }

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use storeroom_core::Level;

    use super::*;
    use crate::db::test_support::memory_pool;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_verify_garbage_hash_is_false() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_authenticate_happy_path() {
        let pool = memory_pool().await;
        let hash = hash_password("hunter2").expect("hash");
        UserRepository::new(&pool)
            .create("Pat", "pat", &hash, Level::USER)
            .await
            .expect("create user");

        let user = AuthService::new(&pool)
            .authenticate("pat", "hunter2")
            .await
            .expect("valid credentials");
        assert_eq!(user.username, "pat");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_password_and_unknown_user() {
        let pool = memory_pool().await;
        let hash = hash_password("hunter2").expect("hash");
        UserRepository::new(&pool)
            .create("Pat", "pat", &hash, Level::USER)
            .await
            .expect("create user");
        let service = AuthService::new(&pool);

        assert!(matches!(
            service.authenticate("pat", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.authenticate("nobody", "hunter2").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_disabled_account() {
        let pool = memory_pool().await;
        let hash = hash_password("hunter2").expect("hash");
        let user = UserRepository::new(&pool)
            .create("Pat", "pat", &hash, Level::USER)
            .await
            .expect("create user");
        sqlx::query("UPDATE users SET status = 0 WHERE id = ?")
            .bind(user.id.as_i64())
            .execute(&pool)
            .await
            .expect("disable");

        assert!(matches!(
            AuthService::new(&pool).authenticate("pat", "hunter2").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
