//! One-shot flash messages.
//!
//! A flash message is a single-slot mailbox in the session: writes within
//! one request cycle overwrite each other, and the first read after a
//! redirect consumes the slot. Delivery is therefore at-most-once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key for the flash slot.
const FLASH_KEY: &str = "flash";

/// How a flash message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Danger,
    Warning,
    Info,
}

impl Severity {
    /// Alert class suffix used by the layout template.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// A pending notification for the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub severity: Severity,
    pub text: String,
}

/// Write the flash slot, overwriting any unread message.
pub async fn flash(session: &Session, severity: Severity, text: impl Into<String>) {
    let message = Flash {
        severity,
        text: text.into(),
    };
    if let Err(err) = session.insert(FLASH_KEY, &message).await {
        tracing::warn!(error = %err, "failed to store flash message");
    }
}

/// Take and clear the flash slot.
///
/// Returns `None` on every call after the first until the next write.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    match session.remove::<Flash>(FLASH_KEY).await {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read flash message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_take_returns_last_write_exactly_once() {
        let session = test_session();

        flash(&session, Severity::Success, "x").await;
        flash(&session, Severity::Danger, "y").await;

        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.severity, Severity::Danger);
        assert_eq!(message.text, "y");

        assert!(take_flash(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_slot_reads_none() {
        let session = test_session();
        assert!(take_flash(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_slot_refills_after_take() {
        let session = test_session();

        flash(&session, Severity::Info, "first").await;
        let _ = take_flash(&session).await;

        flash(&session, Severity::Warning, "second").await;
        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.severity, Severity::Warning);
        assert_eq!(message.text, "second");
    }
}
