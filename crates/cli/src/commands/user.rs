//! User account management commands.

use storeroom_admin::db::{self, UserRepository};
use storeroom_admin::services::hash_password;
use storeroom_core::Level;

use super::{CommandError, connect};

/// Create a user account.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable, the username is
/// taken, or hashing fails.
pub async fn create(
    name: &str,
    username: &str,
    password: &str,
    level: i64,
) -> Result<(), CommandError> {
    let pool = connect().await?;
    db::MIGRATOR.run(&pool).await?;

    let password_hash = hash_password(password)?;
    let user = UserRepository::new(&pool)
        .create(name, username, &password_hash, Level::new(level))
        .await?;

    tracing::info!("Created user {} (id {})", user.username, user.id);
    Ok(())
}
