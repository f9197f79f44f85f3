//! Authentication route handlers.
//!
//! Password login against the `users` table; the session carries only the
//! identity reference afterwards.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::UserRepository;
use crate::flow::{FormData, field};
use crate::middleware::{sign_in, sign_out};
use crate::models::{Flash, Severity, flash, take_flash};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    title: &'static str,
    flash: Option<Flash>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

/// Send the bare root to the login page.
///
/// GET /
async fn index() -> Redirect {
    Redirect::to("/login")
}

/// Render the login page.
///
/// GET /login
async fn login_page(session: Session) -> LoginTemplate {
    LoginTemplate {
        title: "Sign in",
        flash: take_flash(&session).await,
    }
}

/// Process a sign-in attempt.
///
/// POST /login
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    let (Some(username), Some(password)) = (field(&form, "username"), field(&form, "password"))
    else {
        flash(&session, Severity::Danger, "username, password can't be blank.").await;
        return Redirect::to("/login").into_response();
    };

    match AuthService::new(state.pool()).authenticate(username, password).await {
        Ok(user) => {
            if let Err(err) = sign_in(&session, &user).await {
                tracing::error!(error = %err, "failed to bind session");
                flash(&session, Severity::Danger, "Sorry, sign-in failed.").await;
                return Redirect::to("/login").into_response();
            }
            if let Err(err) = UserRepository::new(state.pool()).update_last_login(user.id).await {
                tracing::warn!(error = %err, "failed to stamp last login");
            }
            flash(
                &session,
                Severity::Success,
                format!("Hello {}, welcome to Storeroom.", user.name),
            )
            .await;
            Redirect::to("/admin").into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            flash(
                &session,
                Severity::Danger,
                "Sorry, that username/password is incorrect.",
            )
            .await;
            Redirect::to("/login").into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "sign-in failed");
            flash(&session, Severity::Danger, "Sorry, sign-in failed.").await;
            Redirect::to("/login").into_response()
        }
    }
}

/// Destroy the session and return to the login page.
///
/// GET /logout
async fn logout(session: Session) -> Redirect {
    if let Err(err) = sign_out(&session).await {
        tracing::warn!(error = %err, "failed to destroy session");
    }
    Redirect::to("/login")
}
