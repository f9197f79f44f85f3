//! User group management route handlers (level 1).

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::{Level, Status};

use crate::db::{Collection, GroupRepository, RecordStore};
use crate::filters;
use crate::flow::{FormData, PageFlow, field};
use crate::middleware::require_level;
use crate::models::{Flash, Group, Severity, flash, take_flash};
use crate::state::AppState;

const GROUP_FLOW: PageFlow = PageFlow {
    collection: Collection::UserGroups,
    entity: "Group",
    required: &["group-name", "group-level"],
    list_path: "/groups",
};

/// Group listing template.
#[derive(Template)]
#[template(path = "groups/index.html")]
struct GroupsIndexTemplate {
    title: &'static str,
    flash: Option<Flash>,
    groups: Vec<Group>,
}

/// Add group form template.
#[derive(Template)]
#[template(path = "groups/add.html")]
struct GroupsAddTemplate {
    title: &'static str,
    flash: Option<Flash>,
}

/// Edit group form template.
#[derive(Template)]
#[template(path = "groups/edit.html")]
struct GroupsEditTemplate {
    title: &'static str,
    flash: Option<Flash>,
    group: Group,
}

/// Build the groups router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", get(index))
        .route("/groups/add", get(add_page).post(add))
        .route("/groups/{id}/edit", get(edit_page).post(edit))
        .route("/groups/{id}/delete", get(delete))
}

/// Render the group listing.
///
/// GET /groups
#[instrument(skip(state, session))]
async fn index(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let groups = GroupRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list groups");
            vec![]
        });

    let template = GroupsIndexTemplate {
        title: "Groups",
        flash: take_flash(&session).await,
        groups,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Render the add form.
///
/// GET /groups/add
#[instrument(skip(state, session))]
async fn add_page(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let template = GroupsAddTemplate {
        title: "Add Group",
        flash: take_flash(&session).await,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Create a group.
///
/// POST /groups/add
///
/// Name and level must both be unused; the duplicate checks run before the
/// insert so the visitor gets a readable message, and the UNIQUE
/// constraints backstop the race between check and insert.
#[instrument(skip(state, session, form))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    if let Err(redirect) = GROUP_FLOW.validate(&session, &form, "/groups/add").await {
        return redirect.into_response();
    }

    let Some((name, level)) = parse_group_fields(&form) else {
        flash(&session, Severity::Danger, "Group level must be a number.").await;
        return Redirect::to("/groups/add").into_response();
    };
    let status = parse_status(&form);

    let repo = GroupRepository::new(state.pool());
    match repo.find_by_name(name).await {
        Ok(Some(_)) => {
            flash(&session, Severity::Danger, "That group name already exists.").await;
            return Redirect::to("/groups/add").into_response();
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!(error = %err, "group name check failed");
            flash(&session, Severity::Danger, "Sorry, failed to create the group.").await;
            return Redirect::to("/groups/add").into_response();
        }
    }
    match repo.find_by_level(level).await {
        Ok(Some(_)) => {
            flash(&session, Severity::Danger, "That group level already exists.").await;
            return Redirect::to("/groups/add").into_response();
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!(error = %err, "group level check failed");
            flash(&session, Severity::Danger, "Sorry, failed to create the group.").await;
            return Redirect::to("/groups/add").into_response();
        }
    }

    let outcome = repo.create(name, level, status).await.map(|_| true);
    GROUP_FLOW
        .finish(
            &session,
            outcome,
            "Group has been created.",
            "/groups",
            "Sorry, failed to create the group.",
            "/groups/add",
        )
        .await
        .into_response()
}

/// Render the edit form.
///
/// GET /groups/{id}/edit
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
    if let Err(redirect) = GROUP_FLOW.resolve(&store, &session, id).await {
        return redirect.into_response();
    }
    let group = match GroupRepository::new(state.pool())
        .find_by_id(storeroom_core::GroupId::new(id))
        .await
    {
        Ok(Some(group)) => group,
        _ => return Redirect::to("/groups").into_response(),
    };

    let template = GroupsEditTemplate {
        title: "Edit Group",
        flash: take_flash(&session).await,
        group,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Update a group.
///
/// POST /groups/{id}/edit
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
    let record = match GROUP_FLOW.resolve(&store, &session, id).await {
        Ok(record) => record,
        Err(redirect) => return redirect.into_response(),
    };

    // Success re-displays the edited group, so both outcomes go back to the
    // form; the path is rebuilt from the resolved record's id.
    let back = format!("/groups/{}/edit", record.id());
    if let Err(redirect) = GROUP_FLOW.validate(&session, &form, &back).await {
        return redirect.into_response();
    }

    let Some((name, level)) = parse_group_fields(&form) else {
        flash(&session, Severity::Danger, "Group level must be a number.").await;
        return Redirect::to(&back).into_response();
    };
    let status = parse_status(&form);

    let outcome = GroupRepository::new(state.pool())
        .update(storeroom_core::GroupId::new(record.id()), name, level, status)
        .await;
    let redirect = match outcome {
        Ok(true) => {
            flash(&session, Severity::Success, "Group has been updated.").await;
            Redirect::to(&back)
        }
        Ok(false) => {
            flash(&session, Severity::Danger, "Sorry, failed to update the group.").await;
            Redirect::to(&back)
        }
        Err(err) => {
            tracing::error!(error = %err, "group update failed");
            flash(&session, Severity::Danger, "Sorry, failed to update the group.").await;
            Redirect::to(&back)
        }
    };
    redirect.into_response()
}

/// Delete a group.
///
/// GET /groups/{id}/delete
///
/// A group that still governs user accounts is kept; deleting it would
/// orphan those accounts' levels.
#[instrument(skip(state, session))]
async fn delete(State(state): State<AppState>, session: Session, Path(id): Path<i64>) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let repo = GroupRepository::new(state.pool());
    if let Ok(Some(group)) = repo.find_by_id(storeroom_core::GroupId::new(id)).await
        && repo.member_count(group.level).await.unwrap_or(0) > 0
    {
        flash(
            &session,
            Severity::Danger,
            "Cannot delete a group that still has members.",
        )
        .await;
        return Redirect::to("/groups").into_response();
    }

    let store = RecordStore::new(state.pool());
    GROUP_FLOW
        .delete(
            &store,
            &session,
            id,
            "Group has been deleted.",
            "Group deletion failed.",
        )
        .await
        .into_response()
}

fn parse_group_fields(form: &FormData) -> Option<(&str, Level)> {
    let name = field(form, "group-name")?;
    let level = field(form, "group-level")?.parse::<i64>().ok()?;
    Some((name, Level::new(level)))
}

fn parse_status(form: &FormData) -> Status {
    match field(form, "status") {
        Some("0") => Status::Disabled,
        _ => Status::Active,
    }
}
