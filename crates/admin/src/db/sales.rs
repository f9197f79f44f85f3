//! Sale entry repository.
//!
//! Listing reads join the product name; report reads return one row per
//! sale with the product's pricing so the handlers can aggregate in
//! decimal arithmetic instead of SQL float sums.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use storeroom_core::{Price, ProductId, SaleId};

use super::RepositoryError;
use crate::models::{ReportRow, Sale, SaleWithProduct};

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i64,
    product_id: i64,
    qty: i64,
    price: String,
    date: NaiveDate,
}

impl TryFrom<SaleRow> for Sale {
    type Error = RepositoryError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sale price in database: {e}"))
        })?;
        Ok(Self {
            id: SaleId::new(row.id),
            product_id: ProductId::new(row.product_id),
            qty: row.qty,
            price,
            date: row.date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleWithProductRow {
    id: i64,
    product_id: i64,
    product_name: String,
    qty: i64,
    price: String,
    date: NaiveDate,
}

impl TryFrom<SaleWithProductRow> for SaleWithProduct {
    type Error = RepositoryError;

    fn try_from(row: SaleWithProductRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sale price in database: {e}"))
        })?;
        Ok(Self {
            id: SaleId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            qty: row.qty,
            price,
            date: row.date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReportRowRaw {
    date: NaiveDate,
    product: String,
    qty: i64,
    sale_price: String,
    buy_price: String,
}

impl TryFrom<ReportRowRaw> for ReportRow {
    type Error = RepositoryError;

    fn try_from(row: ReportRowRaw) -> Result<Self, Self::Error> {
        let sale_price = Price::parse(&row.sale_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sale price in database: {e}"))
        })?;
        let buy_price = Price::parse(&row.buy_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid buy price in database: {e}"))
        })?;
        Ok(Self {
            date: row.date,
            product: row.product,
            qty: row.qty,
            sale_price,
            buy_price,
        })
    }
}

const SALE_JOIN: &str = "SELECT s.id, s.product_id, p.name AS product_name, s.qty, s.price, s.date \
     FROM sales s JOIN products p ON p.id = s.product_id";

/// Repository for sale database operations.
pub struct SaleRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SaleRepository<'a> {
    /// Create a new sale repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a sale by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn find_by_id(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        let row: Option<SaleRow> =
            sqlx::query_as("SELECT id, product_id, qty, price, date FROM sales WHERE id = ?")
                .bind(id.as_i64())
                .fetch_optional(self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// List all sales with product names, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_with_product(&self) -> Result<Vec<SaleWithProduct>, RepositoryError> {
        let rows: Vec<SaleWithProductRow> =
            sqlx::query_as(&format!("{SALE_JOIN} ORDER BY s.date DESC"))
                .fetch_all(self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// The most recent sales (dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn find_recent(&self, limit: i64) -> Result<Vec<SaleWithProduct>, RepositoryError> {
        let rows: Vec<SaleWithProductRow> =
            sqlx::query_as(&format!("{SALE_JOIN} ORDER BY s.date DESC LIMIT ?"))
                .bind(limit)
                .fetch_all(self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Sales within an inclusive date range, joined with product pricing,
    /// newest first. Raw material for the range/daily/monthly reports.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn report_rows(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReportRow>, RepositoryError> {
        let rows: Vec<ReportRowRaw> = sqlx::query_as(
            "SELECT s.date, p.name AS product, s.qty, p.sale_price, p.buy_price \
             FROM sales s JOIN products p ON p.id = s.product_id \
             WHERE s.date BETWEEN ? AND ? \
             ORDER BY s.date DESC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Record a sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    /// Returns `RepositoryError::DataCorruption` if the returned row is invalid.
    pub async fn create(
        &self,
        product_id: ProductId,
        qty: i64,
        price: Price,
        date: NaiveDate,
    ) -> Result<Sale, RepositoryError> {
        let row: SaleRow = sqlx::query_as(
            "INSERT INTO sales (product_id, qty, price, date) VALUES (?, ?, ?, ?) \
             RETURNING id, product_id, qty, price, date",
        )
        .bind(product_id.as_i64())
        .bind(qty)
        .bind(price.to_string())
        .bind(date)
        .fetch_one(self.pool)
        .await?;
        row.try_into()
    }

    /// Update a sale entry.
    ///
    /// Returns `true` iff exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn update(
        &self,
        id: SaleId,
        product_id: ProductId,
        qty: i64,
        price: Price,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE sales SET product_id = ?, qty = ?, price = ?, date = ? WHERE id = ?")
                .bind(product_id.as_i64())
                .bind(qty)
                .bind(price.to_string())
                .bind(date)
                .bind(id.as_i64())
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
