//! The shared shape of every CRUD page.
//!
//! Each page follows the same steps: gate, resolve the target record,
//! validate the submitted fields, perform exactly one mutation, then flash
//! and redirect. [`PageFlow`] captures that shape once, parameterized by
//! collection, entity label, required fields and destinations, so the
//! per-entity handlers stay thin.
//!
//! Expected failures (missing record, blank fields, a failed mutation)
//! never escape as errors; they become a danger flash plus a redirect, and
//! raw database error text is never shown to the visitor.

use std::collections::HashMap;

use axum::response::Redirect;
use tower_sessions::Session;

use crate::db::{Collection, Record, RecordStore, RepositoryError};
use crate::models::{Severity, flash};

/// Form payload for the CRUD pages: field name to raw submitted value.
pub type FormData = HashMap<String, String>;

/// A submitted field, trimmed; `None` when absent or blank.
#[must_use]
pub fn field<'a>(form: &'a FormData, name: &str) -> Option<&'a str> {
    form.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// The per-entity parameters of the shared page flow.
#[derive(Debug, Clone, Copy)]
pub struct PageFlow {
    /// Which collection the page operates on.
    pub collection: Collection,
    /// Entity label used in messages ("Group", "Product", ...).
    pub entity: &'static str,
    /// Fields that must be present and non-blank on submissions.
    pub required: &'static [&'static str],
    /// The collection's list page, target of not-found redirects.
    pub list_path: &'static str,
}

impl PageFlow {
    /// Resolve the target record of an edit/delete form by id.
    ///
    /// # Errors
    ///
    /// A missing record flashes "Missing <Entity> id." and redirects to the
    /// list page; an infrastructure failure is logged and flashes a generic
    /// message with the same redirect. Either way the page must not proceed.
    pub async fn resolve(
        &self,
        store: &RecordStore<'_>,
        session: &Session,
        id: i64,
    ) -> Result<Record, Redirect> {
        match store.find_by_id(self.collection, id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => {
                flash(
                    session,
                    Severity::Danger,
                    format!("Missing {} id.", self.entity),
                )
                .await;
                Err(Redirect::to(self.list_path))
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    collection = %self.collection,
                    id,
                    "failed to resolve record"
                );
                flash(
                    session,
                    Severity::Danger,
                    format!("Sorry, failed to load the {}.", self.entity),
                )
                .await;
                Err(Redirect::to(self.list_path))
            }
        }
    }

    /// Check that every declared required field is present and non-blank.
    ///
    /// # Errors
    ///
    /// On any missing field, flashes a danger message listing the missing
    /// fields (comma-joined) and redirects back to `back`. The mutation
    /// must not be attempted.
    pub async fn validate(
        &self,
        session: &Session,
        form: &FormData,
        back: &str,
    ) -> Result<(), Redirect> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .copied()
            .filter(|name| field(form, name).is_none())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        flash(
            session,
            Severity::Danger,
            format!("{} can't be blank.", missing.join(", ")),
        )
        .await;
        Err(Redirect::to(back))
    }

    /// Convert a mutation outcome into the closing flash + redirect.
    ///
    /// Success means the mutation touched exactly one row. Failure - zero
    /// rows or a repository error - flashes `fail_text` and goes back to
    /// `fail_to`; the error itself only reaches the log.
    pub async fn finish(
        &self,
        session: &Session,
        outcome: Result<bool, RepositoryError>,
        ok_text: &str,
        ok_to: &'static str,
        fail_text: &str,
        fail_to: &'static str,
    ) -> Redirect {
        match outcome {
            Ok(true) => {
                flash(session, Severity::Success, ok_text).await;
                Redirect::to(ok_to)
            }
            Ok(false) => {
                flash(session, Severity::Danger, fail_text).await;
                Redirect::to(fail_to)
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    collection = %self.collection,
                    "mutation failed"
                );
                flash(session, Severity::Danger, fail_text).await;
                Redirect::to(fail_to)
            }
        }
    }

    /// The whole delete flow: resolve, delete, flash, redirect.
    ///
    /// Deleting an id that is already gone is not an error - it takes the
    /// "Missing <Entity> id." path, on the second call just like the first.
    pub async fn delete(
        &self,
        store: &RecordStore<'_>,
        session: &Session,
        id: i64,
        ok_text: &str,
        fail_text: &str,
    ) -> Redirect {
        let record = match self.resolve(store, session, id).await {
            Ok(record) => record,
            Err(redirect) => return redirect,
        };

        let outcome = store.delete_by_id(self.collection, record.id()).await;
        self.finish(
            session,
            outcome,
            ok_text,
            self.list_path,
            fail_text,
            self.list_path,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::db::test_support::memory_pool;
    use crate::models::take_flash;

    const CATEGORY_FLOW: PageFlow = PageFlow {
        collection: Collection::Categories,
        entity: "Categorie",
        required: &["categorie-name"],
        list_path: "/categories",
    };

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn form(entries: &[(&str, &str)]) -> FormData {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn test_field_trims_and_drops_blank() {
        let data = form(&[("a", "  x "), ("b", "   ")]);
        assert_eq!(field(&data, "a"), Some("x"));
        assert_eq!(field(&data, "b"), None);
        assert_eq!(field(&data, "missing"), None);
    }

    #[tokio::test]
    async fn test_validate_lists_missing_fields() {
        const FLOW: PageFlow = PageFlow {
            collection: Collection::UserGroups,
            entity: "Group",
            required: &["group-name", "group-level"],
            list_path: "/groups",
        };
        let session = test_session();
        let data = form(&[("group-level", "2")]);

        let result = FLOW.validate(&session, &data, "/groups/add").await;
        assert!(result.is_err());
        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.severity, Severity::Danger);
        assert_eq!(message.text, "group-name can't be blank.");
    }

    #[tokio::test]
    async fn test_validate_passes_complete_form() {
        let session = test_session();
        let data = form(&[("categorie-name", "Drinks")]);
        assert!(
            CATEGORY_FLOW
                .validate(&session, &data, "/categories")
                .await
                .is_ok()
        );
        assert!(take_flash(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_missing_record_flashes_entity_label() {
        let pool = memory_pool().await;
        let store = RecordStore::new(&pool);
        let session = test_session();

        let result = CATEGORY_FLOW.resolve(&store, &session, 123).await;
        assert!(result.is_err());
        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.text, "Missing Categorie id.");
    }

    #[tokio::test]
    async fn test_delete_twice_reports_missing_both_times() {
        let pool = memory_pool().await;
        let store = RecordStore::new(&pool);
        let session = test_session();

        sqlx::query("INSERT INTO categories (name) VALUES ('Drinks')")
            .execute(&pool)
            .await
            .expect("insert");

        // First delete succeeds.
        let _ = CATEGORY_FLOW
            .delete(&store, &session, 1, "Categorie deleted.", "Delete failed.")
            .await;
        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.severity, Severity::Success);

        // Second and third deletes both take the missing-id path.
        for _ in 0..2 {
            let _ = CATEGORY_FLOW
                .delete(&store, &session, 1, "Categorie deleted.", "Delete failed.")
                .await;
            let message = take_flash(&session).await.expect("flash present");
            assert_eq!(message.severity, Severity::Danger);
            assert_eq!(message.text, "Missing Categorie id.");
        }
    }

    #[tokio::test]
    async fn test_finish_failure_keeps_raw_error_out_of_flash() {
        let session = test_session();
        let outcome = Err(RepositoryError::Database(sqlx::Error::PoolClosed));
        let _ = CATEGORY_FLOW
            .finish(
                &session,
                outcome,
                "ok",
                "/categories",
                "Sorry, the update failed.",
                "/categories",
            )
            .await;
        let message = take_flash(&session).await.expect("flash present");
        assert_eq!(message.text, "Sorry, the update failed.");
    }
}
