//! Media gallery route handlers (level 2).
//!
//! Uploads are multipart; the bytes go to the upload directory under a
//! randomized name and only the metadata row reaches the database.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use storeroom_core::{Level, MediaId};

use crate::db::{Collection, MediaRepository, RecordStore};
use crate::flow::PageFlow;
use crate::middleware::require_level;
use crate::models::{Flash, Media, Severity, flash, take_flash};
use crate::services::{MediaStorage, UploadError};
use crate::state::AppState;

const MEDIA_FLOW: PageFlow = PageFlow {
    collection: Collection::Media,
    entity: "Photo",
    required: &[],
    list_path: "/media",
};

/// Gallery + upload form template.
#[derive(Template)]
#[template(path = "media/index.html")]
struct MediaIndexTemplate {
    title: &'static str,
    flash: Option<Flash>,
    photos: Vec<Media>,
}

/// Build the media router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/media", get(index).post(upload))
        .route("/media/{id}/delete", get(delete))
}

/// Render the gallery with the upload form.
///
/// GET /media
#[instrument(skip(state, session))]
async fn index(State(state): State<AppState>, session: Session) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let photos = MediaRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to list media");
            vec![]
        });

    let template = MediaIndexTemplate {
        title: "Media",
        flash: take_flash(&session).await,
        photos,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_owned()
    }))
    .into_response()
}

/// Accept an upload.
///
/// POST /media
#[instrument(skip(state, session, multipart))]
async fn upload(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    // First file field wins; the form only has one.
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Ok(Some(part)) = multipart.next_field().await {
        if let Some(file_name) = part.file_name().map(str::to_owned)
            && let Ok(bytes) = part.bytes().await
            && !bytes.is_empty()
        {
            upload = Some((file_name, bytes.to_vec()));
            break;
        }
    }

    let Some((original_name, bytes)) = upload else {
        flash(&session, Severity::Danger, "Please select a file to upload.").await;
        return Redirect::to("/media").into_response();
    };

    let stored_name = match MediaStorage::stored_name(&original_name) {
        Ok(name) => name,
        Err(err @ (UploadError::MissingExtension(_) | UploadError::UnsupportedType(_))) => {
            flash(&session, Severity::Danger, err.to_string()).await;
            return Redirect::to("/media").into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "upload name selection failed");
            flash(&session, Severity::Danger, "Sorry, the upload failed.").await;
            return Redirect::to("/media").into_response();
        }
    };

    if let Err(err) = state.media().save(&stored_name, &bytes).await {
        tracing::error!(error = %err, "failed to store upload");
        flash(&session, Severity::Danger, "Sorry, the upload failed.").await;
        return Redirect::to("/media").into_response();
    }

    let outcome = MediaRepository::new(state.pool())
        .create(&stored_name)
        .await
        .map(|_| true);
    MEDIA_FLOW
        .finish(
            &session,
            outcome,
            "Photo has been uploaded.",
            "/media",
            "Sorry, the upload failed.",
            "/media",
        )
        .await
        .into_response()
}

/// Delete a photo (row first, then best-effort file removal).
///
/// GET /media/{id}/delete
#[instrument(skip(state, session))]
async fn delete(State(state): State<AppState>, session: Session, Path(id): Path<i64>) -> Response {
    if let Err(denied) = require_level(state.pool(), &session, Level::SPECIAL).await {
        return denied.into_response();
    }

    let file_name = match MediaRepository::new(state.pool())
        .find_by_id(MediaId::new(id))
        .await
    {
        Ok(Some(media)) => Some(media.file_name),
        _ => None,
    };

    let store = RecordStore::new(state.pool());
    let redirect = MEDIA_FLOW
        .delete(
            &store,
            &session,
            id,
            "Photo has been deleted.",
            "Photo deletion failed.",
        )
        .await;

    if let Some(file_name) = file_name
        && let Err(err) = state.media().remove(&file_name).await
    {
        tracing::warn!(error = %err, file_name, "failed to remove stored file");
    }

    redirect.into_response()
}
