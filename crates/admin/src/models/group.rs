//! User group domain type.

use storeroom_core::{GroupId, Level, Status};

/// An authorization group.
///
/// The numeric level is the sole authorization unit; name and level are
/// both unique across groups.
#[derive(Debug, Clone)]
pub struct Group {
    /// Unique group ID.
    pub id: GroupId,
    /// Display name ("Admin", "Managers", ...).
    pub name: String,
    /// Authorization tier; lower is stronger.
    pub level: Level,
    /// Whether members of this group may sign in at all.
    pub status: Status,
}
