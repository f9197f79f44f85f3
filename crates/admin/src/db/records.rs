//! Table-agnostic record access.
//!
//! Every collection in the schema exposes an integer primary key named
//! `id`, which is all the generic operations here rely on. The table name
//! is always taken from [`Collection`] - a fixed allowlist baked into the
//! code - so the only SQL text ever assembled from it is trusted; every
//! value reaching a query is a bound parameter.

use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use super::RepositoryError;

/// The collections the generic operations may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    UserGroups,
    Categories,
    Products,
    Media,
    Sales,
}

impl Collection {
    /// The underlying table name.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::UserGroups => "user_groups",
            Self::Categories => "categories",
            Self::Products => "products",
            Self::Media => "media",
            Self::Sales => "sales",
        }
    }

    /// Natural ordering for list reads, if the collection has one.
    ///
    /// Sales are report-oriented and always read newest-first; the other
    /// collections are unordered.
    const fn order_clause(&self) -> &'static str {
        match self {
            Self::Sales => " ORDER BY date DESC",
            _ => "",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.table())
    }
}

/// A generic row handle: column name to JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    /// The row's primary key.
    ///
    /// Present on every row the store returns; defaults to 0 only if the
    /// schema invariant (integer `id` on every table) is broken.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.0.get("id").and_then(Value::as_i64).unwrap_or_default()
    }

    /// A column as text, if present and textual.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    /// A column as an integer, if present and numeric.
    #[must_use]
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.0.get(column).and_then(Value::as_i64)
    }

    /// The full column map.
    #[must_use]
    pub const fn columns(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn row_to_record(row: &SqliteRow) -> Record {
    let mut map = Map::new();
    for col in row.columns() {
        let idx = col.ordinal();
        let val = match row.try_get_raw(idx) {
            Ok(raw) if !raw.is_null() => match raw.type_info().name() {
                "INTEGER" => row
                    .try_get::<i64, _>(idx)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                "REAL" => row
                    .try_get::<f64, _>(idx)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                _ => row
                    .try_get::<String, _>(idx)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            },
            _ => Value::Null,
        };
        map.insert(col.name().to_owned(), val);
    }
    Record(map)
}

/// Table-agnostic find/delete/count over the schema's collections.
pub struct RecordStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RecordStore<'a> {
    /// Create a new record store over a pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up exactly one row by primary key.
    ///
    /// Absence is an expected outcome and surfaces as `None`; callers
    /// branch on presence rather than on errors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(
        &self,
        collection: Collection,
        id: i64,
    ) -> Result<Option<Record>, RepositoryError> {
        let sql = format!("SELECT * FROM {} WHERE id = ? LIMIT 1", collection.table());
        let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool).await?;
        Ok(row.as_ref().map(row_to_record))
    }

    /// All rows of a collection as a finite, re-queryable sequence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_all(&self, collection: Collection) -> Result<Vec<Record>, RepositoryError> {
        let sql = format!(
            "SELECT * FROM {}{}",
            collection.table(),
            collection.order_clause()
        );
        let rows = sqlx::query(&sql).fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Delete one row by primary key.
    ///
    /// Returns `true` iff exactly one row was removed; a missing id is
    /// reported as `false`, not as an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails, or
    /// `RepositoryError::DataCorruption` if more than one row went away
    /// (the primary-key invariant is broken).
    pub async fn delete_by_id(
        &self,
        collection: Collection,
        id: i64,
    ) -> Result<bool, RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", collection.table());
        let result = sqlx::query(&sql).bind(id).execute(self.pool).await?;
        match result.rows_affected() {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(RepositoryError::DataCorruption(format!(
                "delete by id removed {n} rows from {collection}"
            ))),
        }
    }

    /// Total row count of a collection (dashboard tiles).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, collection: Collection) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(id) FROM {}", collection.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(self.pool).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    async fn seed_category(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await
            .expect("insert category")
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_find_by_id_present_and_absent() {
        let pool = memory_pool().await;
        let id = seed_category(&pool, "Drinks").await;
        let store = RecordStore::new(&pool);

        let record = store
            .find_by_id(Collection::Categories, id)
            .await
            .expect("query ok")
            .expect("row present");
        assert_eq!(record.id(), id);
        assert_eq!(record.get_str("name"), Some("Drinks"));

        let missing = store
            .find_by_id(Collection::Categories, id + 100)
            .await
            .expect("query ok");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_by_id_read_stability() {
        let pool = memory_pool().await;
        let id = seed_category(&pool, "Snacks").await;
        let store = RecordStore::new(&pool);

        let first = store
            .find_by_id(Collection::Categories, id)
            .await
            .expect("query ok");
        let second = store
            .find_by_id(Collection::Categories, id)
            .await
            .expect("query ok");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_delete_by_id_reports_exactly_one_row() {
        let pool = memory_pool().await;
        let id = seed_category(&pool, "Stationery").await;
        let store = RecordStore::new(&pool);

        assert!(
            store
                .delete_by_id(Collection::Categories, id)
                .await
                .expect("delete ok")
        );
        // Second delete of the same id: zero rows, false, no error.
        assert!(
            !store
                .delete_by_id(Collection::Categories, id)
                .await
                .expect("delete ok")
        );
    }

    #[tokio::test]
    async fn test_delete_missing_id_leaves_count_unchanged() {
        let pool = memory_pool().await;
        seed_category(&pool, "Tools").await;
        let store = RecordStore::new(&pool);

        let before = store.count(Collection::Categories).await.expect("count");
        let removed = store
            .delete_by_id(Collection::Categories, 9999)
            .await
            .expect("delete ok");
        let after = store.count(Collection::Categories).await.expect("count");

        assert!(!removed);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_find_all_is_restartable() {
        let pool = memory_pool().await;
        seed_category(&pool, "One").await;
        seed_category(&pool, "Two").await;
        let store = RecordStore::new(&pool);

        let first = store.find_all(Collection::Categories).await.expect("list");
        let second = store.find_all(Collection::Categories).await.expect("list");
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sales_listed_newest_first() {
        let pool = memory_pool().await;
        sqlx::query(
            "INSERT INTO products (name, quantity, buy_price, sale_price, date) \
             VALUES ('Widget', 10, '1.00', '2.00', '2026-01-01 00:00:00')",
        )
        .execute(&pool)
        .await
        .expect("insert product");
        for date in ["2026-01-05", "2026-03-01", "2026-02-10"] {
            sqlx::query("INSERT INTO sales (product_id, qty, price, date) VALUES (1, 1, '2.00', ?)")
                .bind(date)
                .execute(&pool)
                .await
                .expect("insert sale");
        }

        let store = RecordStore::new(&pool);
        let sales = store.find_all(Collection::Sales).await.expect("list");
        let dates: Vec<&str> = sales.iter().filter_map(|r| r.get_str("date")).collect();
        assert_eq!(dates, vec!["2026-03-01", "2026-02-10", "2026-01-05"]);
    }

    #[tokio::test]
    async fn test_count_follows_inserts() {
        let pool = memory_pool().await;
        let store = RecordStore::new(&pool);
        assert_eq!(store.count(Collection::Media).await.expect("count"), 0);
        sqlx::query("INSERT INTO media (file_name) VALUES ('a.png')")
            .execute(&pool)
            .await
            .expect("insert media");
        assert_eq!(store.count(Collection::Media).await.expect("count"), 1);
    }
}
