//! Permission levels for page authorization.

use serde::{Deserialize, Serialize};

/// A user group's authorization tier.
///
/// Lower numbers denote stronger privilege: level 1 administrators may open
/// every page, while a level 3 clerk only reaches the pages that declare
/// level 3 (or weaker) as their floor. The comparison direction is fixed
/// here once so that every page check agrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(i64);

impl Level {
    /// Full administrative access (user and group management).
    pub const ADMIN: Self = Self(1);
    /// Stock management access (products, media, reports).
    pub const SPECIAL: Self = Self(2);
    /// Day-to-day access (sales entry, dashboard).
    pub const USER: Self = Self(3);

    /// Create a level from its numeric encoding.
    #[must_use]
    pub const fn new(level: i64) -> Self {
        Self(level)
    }

    /// Get the underlying numeric encoding.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Whether a holder of this level may open a page requiring `required`.
    ///
    /// A numerically smaller (stronger) level passes every check a larger
    /// (weaker) one does.
    #[must_use]
    pub const fn permits(&self, required: Self) -> bool {
        self.0 <= required.0
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Level {
    fn from(level: i64) -> Self {
        Self(level)
    }
}

impl From<Level> for i64 {
    fn from(level: Level) -> Self {
        level.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stronger_level_permits_weaker_pages() {
        assert!(Level::ADMIN.permits(Level::USER));
        assert!(Level::ADMIN.permits(Level::ADMIN));
        assert!(Level::SPECIAL.permits(Level::USER));
    }

    #[test]
    fn test_weaker_level_denied_stronger_pages() {
        assert!(!Level::USER.permits(Level::ADMIN));
        assert!(!Level::USER.permits(Level::SPECIAL));
        assert!(!Level::SPECIAL.permits(Level::ADMIN));
    }

    #[test]
    fn test_equal_level_permits() {
        assert!(Level::new(2).permits(Level::new(2)));
    }
}
