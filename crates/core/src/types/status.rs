//! Active/disabled status flag shared by users and user groups.

use serde::{Deserialize, Serialize};

/// Whether an account or group is usable.
///
/// Accounts are never hard-deleted by the profile flows; flipping this flag
/// to `Disabled` is how access is withdrawn. Stored as `1`/`0` in the
/// database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    Disabled,
}

impl Status {
    /// Decode the stored integer flag.
    #[must_use]
    pub const fn from_flag(flag: i64) -> Self {
        if flag == 0 { Self::Disabled } else { Self::Active }
    }

    /// Encode as the stored integer flag.
    #[must_use]
    pub const fn as_flag(&self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Disabled => 0,
        }
    }

    /// Whether the account or group may be used.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Disabled => write!(f, "Disabled"),
        }
    }
}
