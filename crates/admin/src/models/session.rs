//! Session-stored identity types.
//!
//! Minimal data stored in the session to identify the signed-in user. The
//! permission gate re-reads the full account from the database on every
//! request, so a disabled account or group takes effect immediately rather
//! than at next sign-in.

use serde::{Deserialize, Serialize};

use storeroom_core::{Level, UserId};

use super::user::User;

/// Session-stored identity reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's login name.
    pub username: String,
    /// User's display name.
    pub name: String,
    /// User's authorization tier at sign-in time.
    pub level: Level,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            level: user.level,
        }
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the signed-in identity reference.
    pub const CURRENT_USER: &str = "current_user";
}
