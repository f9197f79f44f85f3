//! Inventory product repository.
//!
//! Prices are stored as decimal TEXT and parsed at the row boundary, so a
//! bad value in the database surfaces as `DataCorruption` instead of a
//! silently wrong float.

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use storeroom_core::{CategoryId, MediaId, Price, ProductId};

use super::RepositoryError;
use crate::models::{Product, ProductDetail, TopSeller};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    quantity: i64,
    buy_price: String,
    sale_price: String,
    categorie_id: Option<i64>,
    media_id: Option<i64>,
    date: NaiveDateTime,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let buy_price = Price::parse(&row.buy_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid buy price in database: {e}"))
        })?;
        let sale_price = Price::parse(&row.sale_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sale price in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            quantity: row.quantity,
            buy_price,
            sale_price,
            categorie_id: row.categorie_id.map(CategoryId::new),
            media_id: row.media_id.map(MediaId::new),
            date: row.date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductDetailRow {
    #[sqlx(flatten)]
    product: ProductRow,
    categorie: Option<String>,
    image: Option<String>,
}

impl TryFrom<ProductDetailRow> for ProductDetail {
    type Error = RepositoryError;

    fn try_from(row: ProductDetailRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product: row.product.try_into()?,
            categorie: row.categorie,
            image: row.image,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TopSellerRow {
    name: String,
    times_sold: i64,
    total_qty: i64,
}

const PRODUCT_COLUMNS: &str =
    "id, name, quantity, buy_price, sale_price, categorie_id, media_id, date";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
                .bind(id.as_i64())
                .fetch_optional(self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// List all products joined with category name and photo file name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_with_details(&self) -> Result<Vec<ProductDetail>, RepositoryError> {
        let rows: Vec<ProductDetailRow> = sqlx::query_as(
            "SELECT p.id, p.name, p.quantity, p.buy_price, p.sale_price, \
                    p.categorie_id, p.media_id, p.date, \
                    c.name AS categorie, m.file_name AS image \
             FROM products p \
             LEFT JOIN categories c ON c.id = p.categorie_id \
             LEFT JOIN media m ON m.id = p.media_id \
             ORDER BY p.id ASC",
        )
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// The most recently added products (dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn find_recent(&self, limit: i64) -> Result<Vec<ProductDetail>, RepositoryError> {
        let rows: Vec<ProductDetailRow> = sqlx::query_as(
            "SELECT p.id, p.name, p.quantity, p.buy_price, p.sale_price, \
                    p.categorie_id, p.media_id, p.date, \
                    c.name AS categorie, m.file_name AS image \
             FROM products p \
             LEFT JOIN categories c ON c.id = p.categorie_id \
             LEFT JOIN media m ON m.id = p.media_id \
             ORDER BY p.id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Products ranked by units sold (dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_sellers(&self, limit: i64) -> Result<Vec<TopSeller>, RepositoryError> {
        let rows: Vec<TopSellerRow> = sqlx::query_as(
            "SELECT p.name, COUNT(s.product_id) AS times_sold, \
                    COALESCE(SUM(s.qty), 0) AS total_qty \
             FROM sales s \
             JOIN products p ON p.id = s.product_id \
             GROUP BY s.product_id \
             ORDER BY SUM(s.qty) DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| TopSeller {
                name: r.name,
                times_sold: r.times_sold,
                total_qty: r.total_qty,
            })
            .collect())
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    /// Returns `RepositoryError::DataCorruption` if the returned row is invalid.
    pub async fn create(
        &self,
        name: &str,
        quantity: i64,
        buy_price: Price,
        sale_price: Price,
        categorie_id: Option<CategoryId>,
        media_id: Option<MediaId>,
        date: NaiveDateTime,
    ) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (name, quantity, buy_price, sale_price, categorie_id, media_id, date) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(quantity)
        .bind(buy_price.to_string())
        .bind(sale_price.to_string())
        .bind(categorie_id.map(|c| c.as_i64()))
        .bind(media_id.map(|m| m.as_i64()))
        .bind(date)
        .fetch_one(self.pool)
        .await?;
        row.try_into()
    }

    /// Update a product's editable fields.
    ///
    /// Returns `true` iff exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn update(
        &self,
        id: ProductId,
        name: &str,
        quantity: i64,
        buy_price: Price,
        sale_price: Price,
        categorie_id: Option<CategoryId>,
        media_id: Option<MediaId>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET name = ?, quantity = ?, buy_price = ?, sale_price = ?, \
             categorie_id = ?, media_id = ? WHERE id = ?",
        )
        .bind(name)
        .bind(quantity)
        .bind(buy_price.to_string())
        .bind(sale_price.to_string())
        .bind(categorie_id.map(|c| c.as_i64()))
        .bind(media_id.map(|m| m.as_i64()))
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Take `qty` units out of stock after a sale entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn take_stock(&self, id: ProductId, qty: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE products SET quantity = quantity - ? WHERE id = ?")
            .bind(qty)
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
