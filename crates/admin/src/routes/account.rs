//! Profile and password route handlers for the signed-in account.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::UserId;

use crate::db::UserRepository;
use crate::filters;
use crate::flow::{FormData, field};
use crate::middleware::{RequireAuth, sign_out};
use crate::models::{Flash, Severity, User, flash, take_flash};
use crate::services::{hash_password, verify_password};
use crate::state::AppState;

/// Profile page template.
#[derive(Template)]
#[template(path = "account/profile.html")]
struct ProfileTemplate {
    title: &'static str,
    flash: Option<Flash>,
    user: User,
}

/// Edit own profile template.
#[derive(Template)]
#[template(path = "account/edit.html")]
struct AccountEditTemplate {
    title: &'static str,
    flash: Option<Flash>,
    user: User,
}

/// Change password template.
#[derive(Template)]
#[template(path = "account/password.html")]
struct PasswordTemplate {
    title: &'static str,
    flash: Option<Flash>,
}

/// Build the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{id}", get(profile))
        .route("/account/edit", get(edit_page).post(edit))
        .route("/account/password", get(password_page).post(change_password))
}

/// Render a profile page.
///
/// GET /profile/{id}
#[instrument(skip(state, session))]
async fn profile(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    let user = match UserRepository::new(state.pool()).find_by_id(UserId::new(id)).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            flash(&session, Severity::Danger, "Missing User id.").await;
            return Redirect::to("/home").into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to load profile");
            flash(&session, Severity::Danger, "Sorry, failed to load the profile.").await;
            return Redirect::to("/home").into_response();
        }
    };

    let template = ProfileTemplate {
        title: "Profile",
        flash: take_flash(&session).await,
        user,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Render the edit-own-profile form.
///
/// GET /account/edit
#[instrument(skip(state, session))]
async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
) -> Response {
    let user = match UserRepository::new(state.pool()).find_by_id(current.id).await {
        Ok(Some(user)) => user,
        _ => return Redirect::to("/home").into_response(),
    };

    let template = AccountEditTemplate {
        title: "Edit Account",
        flash: take_flash(&session).await,
        user,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Update the signed-in account's name and username.
///
/// POST /account/edit
#[instrument(skip(state, session, form))]
async fn edit(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    let (Some(name), Some(username)) = (field(&form, "name"), field(&form, "username")) else {
        flash(&session, Severity::Danger, "name, username can't be blank.").await;
        return Redirect::to("/account/edit").into_response();
    };

    let outcome = UserRepository::new(state.pool())
        .update_profile(current.id, name, username)
        .await;
    match outcome {
        Ok(true) => flash(&session, Severity::Success, "Account updated.").await,
        Ok(false) => {
            flash(&session, Severity::Danger, "Sorry, failed to update the account.").await;
        }
        Err(err) => {
            tracing::error!(error = %err, "profile update failed");
            flash(&session, Severity::Danger, "Sorry, failed to update the account.").await;
        }
    }
    Redirect::to("/account/edit").into_response()
}

/// Render the change-password form.
///
/// GET /account/password
async fn password_page(RequireAuth(_current): RequireAuth, session: Session) -> Response {
    let template = PasswordTemplate {
        title: "Change Password",
        flash: take_flash(&session).await,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Change the signed-in account's password.
///
/// POST /account/password
///
/// On success the session is destroyed; the visitor signs back in with the
/// new password.
#[instrument(skip(state, session, form))]
async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    let (Some(old_password), Some(new_password)) =
        (field(&form, "old-password"), field(&form, "new-password"))
    else {
        flash(
            &session,
            Severity::Danger,
            "old-password, new-password can't be blank.",
        )
        .await;
        return Redirect::to("/account/password").into_response();
    };

    let repo = UserRepository::new(state.pool());
    let user = match repo.find_by_id(current.id).await {
        Ok(Some(user)) => user,
        _ => return Redirect::to("/home").into_response(),
    };

    if !verify_password(old_password, &user.password_hash) {
        flash(&session, Severity::Danger, "Your old password does not match.").await;
        return Redirect::to("/account/password").into_response();
    }

    let password_hash = match hash_password(new_password) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!(error = %err, "password hashing failed");
            flash(&session, Severity::Danger, "Sorry, failed to update the password.").await;
            return Redirect::to("/account/password").into_response();
        }
    };

    match repo.update_password(user.id, &password_hash).await {
        Ok(true) => {
            if let Err(err) = sign_out(&session).await {
                tracing::warn!(error = %err, "failed to destroy session");
            }
            flash(&session, Severity::Success, "Login with your new password.").await;
            Redirect::to("/login").into_response()
        }
        Ok(false) => {
            flash(&session, Severity::Danger, "Sorry, failed to update the password.").await;
            Redirect::to("/account/password").into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "password update failed");
            flash(&session, Severity::Danger, "Sorry, failed to update the password.").await;
            Redirect::to("/account/password").into_response()
        }
    }
}
