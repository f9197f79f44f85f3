//! Seed command: default groups, an admin account, and sample stock.

use chrono::Utc;

use storeroom_admin::db::{
    self, CategoryRepository, GroupRepository, ProductRepository, UserRepository,
};
use storeroom_admin::services::hash_password;
use storeroom_core::{Level, Price, Status};

use super::{CommandError, connect};

const DEFAULT_GROUPS: &[(&str, i64)] = &[("admin", 1), ("special", 2), ("user", 3)];

/// Seed the database. Safe to re-run: existing rows are left alone.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    db::MIGRATOR.run(&pool).await?;

    let groups = GroupRepository::new(&pool);
    for (name, level) in DEFAULT_GROUPS {
        if groups.find_by_level(Level::new(*level)).await?.is_none() {
            groups.create(name, Level::new(*level), Status::Active).await?;
            tracing::info!("Created group {name} (level {level})");
        }
    }

    let users = UserRepository::new(&pool);
    if users.find_by_username("admin").await?.is_none() {
        let password_hash = hash_password("admin")?;
        users
            .create("Administrator", "admin", &password_hash, Level::ADMIN)
            .await?;
        tracing::info!("Created default admin account (username: admin, password: admin)");
        tracing::warn!("Change the default admin password after first sign-in");
    }

    let categories = CategoryRepository::new(&pool);
    if categories.list_all().await?.is_empty() {
        let general = categories.create("general").await?;
        ProductRepository::new(&pool)
            .create(
                "Sample product",
                25,
                Price::parse("1.00")?,
                Price::parse("2.50")?,
                Some(general.id),
                None,
                Utc::now().naive_utc(),
            )
            .await?;
        tracing::info!("Created sample category and product");
    }

    Ok(())
}
