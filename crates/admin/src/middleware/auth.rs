//! Authentication helpers and the permission gate.
//!
//! Every page declares a required [`Level`] and runs [`require_level`]
//! before doing anything else - including read-only dashboards. The gate
//! re-reads the account and its group from the database on each request so
//! a freshly disabled account or group locks out immediately.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use storeroom_core::Level;

use crate::db::{GroupRepository, UserRepository};
use crate::models::{CurrentUser, Severity, User, flash, session_keys};

/// Location unauthenticated visitors are sent to.
const LOGIN_PATH: &str = "/login";
/// Location authenticated-but-denied visitors are sent to.
const HOME_PATH: &str = "/home";

/// Why the permission gate refused a request.
///
/// Conversion into a response yields the matching redirect; the gate has
/// already written the flash message by the time a `Denied` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    /// No identity bound to the session.
    NotAuthenticated,
    /// The identity's group has its active flag cleared (or is gone).
    GroupDisabled,
    /// The identity's level is weaker than the page requires.
    InsufficientLevel,
}

impl Denied {
    /// Where the denied request is redirected.
    #[must_use]
    pub const fn redirect_target(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => LOGIN_PATH,
            Self::GroupDisabled | Self::InsufficientLevel => HOME_PATH,
        }
    }
}

impl IntoResponse for Denied {
    fn into_response(self) -> Response {
        Redirect::to(self.redirect_target()).into_response()
    }
}

/// The permission gate.
///
/// Deny reasons are checked in priority order: missing identity, disabled
/// group, insufficient level. On deny the gate writes the danger flash and
/// returns the redirect reason; on allow it hands back the freshly loaded
/// account with no side effect.
///
/// # Errors
///
/// Returns [`Denied`] when the request may not proceed. Infrastructure
/// failures while loading the account are logged and treated as
/// `NotAuthenticated` - the visitor lands on the login page rather than a
/// raw error.
pub async fn require_level(
    pool: &SqlitePool,
    session: &Session,
    required: Level,
) -> Result<User, Denied> {
    let current: Option<CurrentUser> = session
        .get(session_keys::CURRENT_USER)
        .await
        .unwrap_or_default();

    let Some(current) = current else {
        flash(session, Severity::Danger, "Please log in.").await;
        return Err(Denied::NotAuthenticated);
    };

    let user = match UserRepository::new(pool).find_by_id(current.id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // The account went away under the session; drop the session.
            let _ = session.flush().await;
            flash(session, Severity::Danger, "Please log in.").await;
            return Err(Denied::NotAuthenticated);
        }
        Err(err) => {
            tracing::error!(error = %err, "permission gate failed to load user");
            flash(session, Severity::Danger, "Please log in.").await;
            return Err(Denied::NotAuthenticated);
        }
    };

    let group = match GroupRepository::new(pool).find_by_level(user.level).await {
        Ok(group) => group,
        Err(err) => {
            tracing::error!(error = %err, "permission gate failed to load group");
            None
        }
    };

    if !group.is_some_and(|g| g.status.is_active()) {
        flash(
            session,
            Severity::Danger,
            "This user group has been disabled.",
        )
        .await;
        return Err(Denied::GroupDisabled);
    }

    if !user.level.permits(required) {
        flash(
            session,
            Severity::Danger,
            "Sorry, you don't have permission to view that page.",
        )
        .await;
        return Err(Denied::InsufficientLevel);
    }

    Ok(user)
}

/// Bind an identity to the session after a successful sign-in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(session: &Session, user: &User) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(user))
        .await
}

/// Destroy the session (sign-out).
///
/// All session state goes away, including any unread flash message.
///
/// # Errors
///
/// Returns an error if the session store cannot be reached.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Extractor that requires a signed-in identity without a level floor.
///
/// Pages that only need to know who is asking (the profile page) use this
/// instead of the full gate. Redirects to the login page when anonymous.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(current): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", current.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(Redirect::to(LOGIN_PATH).into_response());
        };

        let current: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .unwrap_or_default();

        match current {
            Some(current) => Ok(Self(current)),
            None => {
                flash(session, Severity::Danger, "Please log in.").await;
                Err(Redirect::to(LOGIN_PATH).into_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use storeroom_core::Status;

    use super::*;
    use crate::db::test_support::memory_pool;
    use crate::models::take_flash;

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn seed_group(pool: &SqlitePool, name: &str, level: i64, status: i64) {
        sqlx::query(
            "INSERT INTO user_groups (group_name, group_level, group_status) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(level)
        .bind(status)
        .execute(pool)
        .await
        .expect("insert group");
    }

    async fn seed_user(pool: &SqlitePool, username: &str, level: i64) -> User {
        sqlx::query("INSERT INTO users (name, username, password_hash, user_level) VALUES (?, ?, 'x', ?)")
            .bind(username)
            .bind(username)
            .bind(level)
            .execute(pool)
            .await
            .expect("insert user");
        UserRepository::new(pool)
            .find_by_username(username)
            .await
            .expect("query ok")
            .expect("user present")
    }

    #[tokio::test]
    async fn test_anonymous_denied_regardless_of_level() {
        let pool = memory_pool().await;
        let session = test_session();

        for required in [Level::ADMIN, Level::USER, Level::new(99)] {
            let denied = require_level(&pool, &session, required)
                .await
                .expect_err("anonymous must be denied");
            assert_eq!(denied, Denied::NotAuthenticated);
            assert_eq!(denied.redirect_target(), "/login");
        }
        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.severity, Severity::Danger);
    }

    #[tokio::test]
    async fn test_disabled_group_denied_even_with_qualifying_level() {
        let pool = memory_pool().await;
        seed_group(&pool, "Admin", 1, 0).await;
        let user = seed_user(&pool, "alex", 1).await;

        let session = test_session();
        sign_in(&session, &user).await.expect("sign in");

        let denied = require_level(&pool, &session, Level::USER)
            .await
            .expect_err("disabled group must be denied");
        assert_eq!(denied, Denied::GroupDisabled);
        assert_eq!(denied.redirect_target(), "/home");
    }

    #[tokio::test]
    async fn test_insufficient_level_denied() {
        let pool = memory_pool().await;
        seed_group(&pool, "Clerks", 3, 1).await;
        let user = seed_user(&pool, "pat", 3).await;

        let session = test_session();
        sign_in(&session, &user).await.expect("sign in");

        let denied = require_level(&pool, &session, Level::ADMIN)
            .await
            .expect_err("weak level must be denied");
        assert_eq!(denied, Denied::InsufficientLevel);

        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.severity, Severity::Danger);
    }

    #[tokio::test]
    async fn test_allow_leaves_no_flash_behind() {
        let pool = memory_pool().await;
        seed_group(&pool, "Admin", 1, 1).await;
        let user = seed_user(&pool, "alex", 1).await;

        let session = test_session();
        sign_in(&session, &user).await.expect("sign in");

        let allowed = require_level(&pool, &session, Level::USER)
            .await
            .expect("strong level must pass");
        assert_eq!(allowed.username, "alex");
        assert!(take_flash(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_destroys_unread_flash() {
        let pool = memory_pool().await;
        seed_group(&pool, "Admin", 1, 1).await;
        let user = seed_user(&pool, "alex", 1).await;

        let session = test_session();
        sign_in(&session, &user).await.expect("sign in");
        flash(&session, Severity::Info, "pending").await;

        sign_out(&session).await.expect("sign out");
        assert!(take_flash(&session).await.is_none());

        let denied = require_level(&pool, &session, Level::USER)
            .await
            .expect_err("signed-out session is anonymous");
        assert_eq!(denied, Denied::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_status_flag_drives_group_disabled() {
        let pool = memory_pool().await;
        seed_group(&pool, "Special", 2, Status::Active.as_flag()).await;
        let user = seed_user(&pool, "sam", 2).await;

        let session = test_session();
        sign_in(&session, &user).await.expect("sign in");
        assert!(require_level(&pool, &session, Level::SPECIAL).await.is_ok());

        sqlx::query("UPDATE user_groups SET group_status = 0 WHERE group_level = 2")
            .execute(&pool)
            .await
            .expect("disable group");
        let denied = require_level(&pool, &session, Level::SPECIAL)
            .await
            .expect_err("now disabled");
        assert_eq!(denied, Denied::GroupDisabled);
    }
}
