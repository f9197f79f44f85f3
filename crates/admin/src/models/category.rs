//! Product category domain type.

use storeroom_core::CategoryId;

/// A product category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}
