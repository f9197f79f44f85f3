//! Category management route handlers (level 1).
//!
//! The listing page carries the inline add form, matching how the original
//! screen works.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::{CategoryId, Level};

use crate::db::{CategoryRepository, Collection, RecordStore};
use crate::filters;
use crate::flow::{FormData, PageFlow, field};
use crate::middleware::require_level;
use crate::models::{Category, Flash, Severity, flash, take_flash};
use crate::state::AppState;

const CATEGORY_FLOW: PageFlow = PageFlow {
    collection: Collection::Categories,
    entity: "Categorie",
    required: &["categorie-name"],
    list_path: "/categories",
};

/// Category listing + add form template.
#[derive(Template)]
#[template(path = "categories/index.html")]
struct CategoriesIndexTemplate {
    title: &'static str,
    flash: Option<Flash>,
    categories: Vec<Category>,
}

/// Edit category form template.
#[derive(Template)]
#[template(path = "categories/edit.html")]
struct CategoriesEditTemplate {
    title: &'static str,
    flash: Option<Flash>,
    category: Category,
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index).post(add))
        .route("/categories/{id}/edit", get(edit_page).post(edit))
        .route("/categories/{id}/delete", get(delete))
}

/// Render the listing with the inline add form.
///
/// GET /categories
#[instrument(skip(state, session))]
async fn index(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let categories = CategoryRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list categories");
            vec![]
        });

    let template = CategoriesIndexTemplate {
        title: "Categories",
        flash: take_flash(&session).await,
        categories,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Create a category.
///
/// POST /categories
#[instrument(skip(state, session, form))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    if let Err(redirect) = CATEGORY_FLOW.validate(&session, &form, "/categories").await {
        return redirect.into_response();
    }
    let Some(name) = field(&form, "categorie-name") else {
        return Redirect::to("/categories").into_response();
    };

    let repo = CategoryRepository::new(state.pool());
    match repo.find_by_name(name).await {
        Ok(Some(_)) => {
            flash(&session, Severity::Danger, "That categorie name already exists.").await;
            return Redirect::to("/categories").into_response();
        }
        Ok(None) => {}
        Err(err) => {
            tracing::error!(error = %err, "categorie name check failed");
            flash(&session, Severity::Danger, "Sorry, failed to add the categorie.").await;
            return Redirect::to("/categories").into_response();
        }
    }

    let outcome = repo.create(name).await.map(|_| true);
    CATEGORY_FLOW
        .finish(
            &session,
            outcome,
            "Successfully added a new categorie.",
            "/categories",
            "Sorry, failed to add the categorie.",
            "/categories",
        )
        .await
        .into_response()
}

/// Render the edit form.
///
/// GET /categories/{id}/edit
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
    if let Err(redirect) = CATEGORY_FLOW.resolve(&store, &session, id).await {
        return redirect.into_response();
    }
    let category = match CategoryRepository::new(state.pool())
        .find_by_id(CategoryId::new(id))
        .await
    {
        Ok(Some(category)) => category,
        _ => return Redirect::to("/categories").into_response(),
    };

    let template = CategoriesEditTemplate {
        title: "Edit Categorie",
        flash: take_flash(&session).await,
        category,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Rename a category.
///
/// POST /categories/{id}/edit
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
    let record = match CATEGORY_FLOW.resolve(&store, &session, id).await {
        Ok(record) => record,
        Err(redirect) => return redirect.into_response(),
    };

    let back = format!("/categories/{}/edit", record.id());
    if let Err(redirect) = CATEGORY_FLOW.validate(&session, &form, &back).await {
        return redirect.into_response();
    }
    let Some(name) = field(&form, "categorie-name") else {
        return Redirect::to(&back).into_response();
    };

    let outcome = CategoryRepository::new(state.pool())
        .update(CategoryId::new(record.id()), name)
        .await;
    CATEGORY_FLOW
        .finish(
            &session,
            outcome,
            "Successfully updated the categorie.",
            "/categories",
            "Sorry, failed to update the categorie.",
            "/categories",
        )
        .await
        .into_response()
}

/// Delete a category.
///
/// GET /categories/{id}/delete
#[instrument(skip(state, session))]
async fn delete(State(state): State<AppState>, session: Session, Path(id): Path<i64>) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::ADMIN).await {
        return denied.into_response();
    }

    let store = RecordStore::new(state.pool());
    CATEGORY_FLOW
        .delete(
            &store,
            &session,
            id,
            "Categorie deleted.",
            "Categorie deletion failed.",
        )
        .await
        .into_response()
}
