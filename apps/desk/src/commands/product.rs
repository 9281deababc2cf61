//! # Product Commands
//!
//! Catalog maintenance and lookups.
//!
//! ## Stock Adjustment
//! ```text
//! adjustStock { id, delta: -5 }
//!       │
//!       ▼
//! stock 10 ──► 5          ok, product returned
//! stock 5  ──► -5 ✗       INSUFFICIENT_STOCK, stock stays 5
//! unknown id              NOT_FOUND
//! ```

use billbook_core::{Product, ProductDraft, ProductUpdate};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;

pub async fn list_products(db: &DbState) -> Result<Vec<Product>, ApiError> {
    Ok(db.inner().products().list().await?)
}

pub async fn get_product(db: &DbState, id: &str) -> Result<Product, ApiError> {
    db.inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Name substring search. A blank query lists everything.
pub async fn search_products(db: &DbState, query: &str) -> Result<Vec<Product>, ApiError> {
    debug!(query = %query, "search_products command");
    Ok(db.inner().products().search(query).await?)
}

pub async fn add_product(db: &DbState, draft: ProductDraft) -> Result<Product, ApiError> {
    let product = db.inner().products().add(draft).await?;
    info!(id = %product.id, name = %product.name, "Product added");
    Ok(product)
}

/// Returns `None` when the product does not exist; nothing is changed.
pub async fn update_product(
    db: &DbState,
    id: &str,
    update: ProductUpdate,
) -> Result<Option<Product>, ApiError> {
    Ok(db.inner().products().update(id, update).await?)
}

/// Returns whether a product was removed. Its children become top level.
pub async fn delete_product(db: &DbState, id: &str) -> Result<bool, ApiError> {
    Ok(db.inner().products().delete(id).await?)
}

pub async fn adjust_stock(db: &DbState, id: &str, delta: i64) -> Result<Product, ApiError> {
    debug!(id = %id, delta, "adjust_stock command");
    Ok(db.inner().products().adjust_stock(id, delta).await?)
}

pub async fn low_stock(db: &DbState) -> Result<Vec<Product>, ApiError> {
    Ok(db.inner().products().low_stock().await?)
}

pub async fn list_categories(db: &DbState) -> Result<Vec<Product>, ApiError> {
    Ok(db.inner().products().categories().await?)
}

/// Products filed under a category. Unknown ids have no children.
pub async fn list_children(db: &DbState, parent_id: &str) -> Result<Vec<Product>, ApiError> {
    Ok(db.inner().products().children_of(parent_id).await?)
}
