//! Sale entry domain types.

use chrono::NaiveDate;
use storeroom_core::{Price, ProductId, SaleId};

/// A recorded sale of one product.
#[derive(Debug, Clone)]
pub struct Sale {
    pub id: SaleId,
    pub product_id: ProductId,
    pub qty: i64,
    /// Line total captured at sale time.
    pub price: Price,
    pub date: NaiveDate,
}

/// A sale joined with its product name for listing pages.
#[derive(Debug, Clone)]
pub struct SaleWithProduct {
    pub id: SaleId,
    pub product_id: ProductId,
    pub product_name: String,
    pub qty: i64,
    pub price: Price,
    pub date: NaiveDate,
}

/// Raw material for the sales reports: one sale joined with the product's
/// current pricing. Aggregation happens in the report handlers, in decimal
/// arithmetic rather than in SQL.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub product: String,
    pub qty: i64,
    pub sale_price: Price,
    pub buy_price: Price,
}
