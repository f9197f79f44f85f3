//! Inventory product domain types.

use chrono::NaiveDateTime;
use storeroom_core::{CategoryId, MediaId, Price, ProductId};

/// An inventory item.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Units on hand; decremented by sale entries.
    pub quantity: i64,
    pub buy_price: Price,
    pub sale_price: Price,
    pub categorie_id: Option<CategoryId>,
    pub media_id: Option<MediaId>,
    /// When the product was added.
    pub date: NaiveDateTime,
}

impl Product {
    /// Whether the product belongs to the given category (templates).
    #[must_use]
    pub fn has_categorie(&self, id: &CategoryId) -> bool {
        self.categorie_id == Some(*id)
    }

    /// Whether the given photo is attached (templates).
    #[must_use]
    pub fn has_photo(&self, id: &MediaId) -> bool {
        self.media_id == Some(*id)
    }
}

/// A product joined with its category name and photo for the listing page.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub categorie: Option<String>,
    /// Stored file name of the product photo, if one is attached.
    pub image: Option<String>,
}

/// Dashboard row: a product ranked by units sold.
#[derive(Debug, Clone)]
pub struct TopSeller {
    pub name: String,
    /// Number of sale entries referencing the product.
    pub times_sold: i64,
    /// Total units across those entries.
    pub total_qty: i64,
}
