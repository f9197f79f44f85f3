//! Staff account domain types.

use chrono::NaiveDateTime;
use storeroom_core::{Level, Status, UserId};

/// A staff account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login name, unique across accounts.
    pub username: String,
    /// Argon2 PHC-format credential hash. Never rendered.
    pub password_hash: String,
    /// Authorization tier, matching a group's level.
    pub level: Level,
    /// Profile image file name under the user upload directory.
    pub image: String,
    /// Disabled accounts cannot sign in.
    pub status: Status,
    /// Last successful sign-in, if any.
    pub last_login: Option<NaiveDateTime>,
}

/// A user joined with their group's display name for the listing page.
#[derive(Debug, Clone)]
pub struct UserWithGroup {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub level: Level,
    pub status: Status,
    pub last_login: Option<NaiveDateTime>,
    /// Group name for the user's level; `None` if no group matches.
    pub group_name: Option<String>,
}
