//! Staff account management route handlers (level 1).

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::{Level, Status, UserId};

use crate::db::{Collection, GroupRepository, RecordStore, UserRepository};
use crate::filters;
use crate::flow::{FormData, PageFlow, field};
use crate::middleware::require_level;
use crate::models::{Flash, Group, Severity, User, UserWithGroup, flash, take_flash};
use crate::services::hash_password;
use crate::state::AppState;

const USER_FLOW: PageFlow = PageFlow {
    collection: Collection::Users,
    entity: "User",
    required: &["full-name", "username", "password", "level"],
    list_path: "/users",
};

/// Fields required when editing (no password change here).
const USER_EDIT_FLOW: PageFlow = PageFlow {
    collection: Collection::Users,
    entity: "User",
    required: &["full-name", "username", "level"],
    list_path: "/users",
};

/// User listing template.
#[derive(Template)]
#[template(path = "users/index.html")]
struct UsersIndexTemplate {
    title: &'static str,
    flash: Option<Flash>,
    users: Vec<UserWithGroup>,
}

/// Add user form template.
#[derive(Template)]
#[template(path = "users/add.html")]
struct UsersAddTemplate {
    title: &'static str,
    flash: Option<Flash>,
    groups: Vec<Group>,
}

/// Edit user form template.
#[derive(Template)]
#[template(path = "users/edit.html")]
struct UsersEditTemplate {
    title: &'static str,
    flash: Option<Flash>,
    user: User,
    groups: Vec<Group>,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/add", get(add_page).post(add))
        .route("/users/{id}/edit", get(edit_page).post(edit))
        .route("/users/{id}/delete", get(delete))
}

async fn load_groups(state: &AppState) -> Vec<Group> {
    GroupRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list groups");
            vec![]
        })
}

/// Render the user listing.
///
/// GET /users
#[instrument(skip(state, session))]
async fn index(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let users = UserRepository::new(state.pool())
        .list_with_groups()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list users");
            vec![]
        });

    let template = UsersIndexTemplate {
        title: "Users",
        flash: take_flash(&session).await,
        users,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Render the add form.
///
/// GET /users/add
#[instrument(skip(state, session))]
async fn add_page(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let template = UsersAddTemplate {
        title: "Add User",
        flash: take_flash(&session).await,
        groups: load_groups(&state).await,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Create an account.
///
/// POST /users/add
#[instrument(skip(state, session, form))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    if let Err(redirect) = USER_FLOW.validate(&session, &form, "/users/add").await {
        return redirect.into_response();
    }

    let (Some(name), Some(username), Some(password), Some(level)) = (
        field(&form, "full-name"),
        field(&form, "username"),
        field(&form, "password"),
        field(&form, "level").and_then(|l| l.parse::<i64>().ok()),
    ) else {
        flash(&session, Severity::Danger, "Level must be a number.").await;
        return Redirect::to("/users/add").into_response();
    };

    let repo = UserRepository::new(state.pool());
    match repo.find_by_username(username).await {
        Ok(Some(_)) => {
            flash(&session, Severity::Danger, "That username is already taken.").await;
            return Redirect::to("/users/add").into_response();
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!(error = %err, "username check failed");
            flash(&session, Severity::Danger, "Sorry, failed to create the account.").await;
            return Redirect::to("/users/add").into_response();
        }
    }

    let password_hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!(error = %err, "password hashing failed");
            flash(&session, Severity::Danger, "Sorry, failed to create the account.").await;
            return Redirect::to("/users/add").into_response();
        }
    };

    let outcome = repo
        .create(name, username, &password_hash, Level::new(level))
        .await
        .map(|_| true);
    USER_FLOW
        .finish(
            &session,
            outcome,
            "User account has been created.",
            "/users",
            "Sorry, failed to create the account.",
            "/users/add",
        )
        .await
        .into_response()
}

/// Render the edit form.
///
/// GET /users/{id}/edit
#[instrument(skip(state, session))]
async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    if let Err(redirect) = USER_FLOW.resolve(&store, &session, id).await {
        return redirect.into_response();
    }
    let user = match UserRepository::new(state.pool()).find_by_id(UserId::new(id)).await {
        Ok(Some(user)) => user,
        _ => return Redirect::to("/users").into_response(),
    };

    let template = UsersEditTemplate {
        title: "Edit User",
        flash: take_flash(&session).await,
        user,
        groups: load_groups(&state).await,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Update an account (name, username, level, status).
///
/// POST /users/{id}/edit
#[instrument(skip(state, session, form))]
async fn edit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    let record = match USER_EDIT_FLOW.resolve(&store, &session, id).await {
        Ok(record) => record,
        Err(redirect) => return redirect.into_response(),
    };

    let back = format!("/users/{}/edit", record.id());
    if let Err(redirect) = USER_EDIT_FLOW.validate(&session, &form, &back).await {
        return redirect.into_response();
    }

    let (Some(name), Some(username), Some(level)) = (
        field(&form, "full-name"),
        field(&form, "username"),
        field(&form, "level").and_then(|l| l.parse::<i64>().ok()),
    ) else {
        flash(&session, Severity::Danger, "Level must be a number.").await;
        return Redirect::to(&back).into_response();
    };
    let status = match field(&form, "status") {
        Some("0") => Status::Disabled,
        _ => Status::Active,
    };

    let outcome = UserRepository::new(state.pool())
        .update(UserId::new(record.id()), name, username, Level::new(level), status)
        .await;
    USER_EDIT_FLOW
        .finish(
            &session,
            outcome,
            "Account updated.",
            "/users",
            "Sorry, failed to update the account.",
            "/users",
        )
        .await
        .into_response()
}

/// Delete an account.
///
/// GET /users/{id}/delete
#[instrument(skip(state, session))]
async fn delete(State(state): State<AppState>, session: Session, Path(id): Path<i64>) -> Response {
    let user = match require_level(state.pool(), &session, Level::ADMIN).await {
        Ok(user) => user,
        Err(denied) => return denied.into_response(),
    };

    // Deleting yourself would strand the session mid-request.
    if user.id.as_i64() == id {
        flash(&session, Severity::Danger, "You cannot delete your own account.").await;
        return Redirect::to("/users").into_response();
    }

    let store = RecordStore::new(state.pool());
    USER_FLOW
        .delete(&store, &session, id, "User deleted.", "User deletion failed.")
        .await
        .into_response()
}
