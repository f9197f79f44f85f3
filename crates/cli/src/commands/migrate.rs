//! Database migration command.

use storeroom_admin::db;

use super::{CommandError, connect};

/// Run the embedded schema migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations complete");

    Ok(())
}
