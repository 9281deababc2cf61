//! # Product Repository
//!
//! Catalog operations over the `products` list.
//!
//! ## Key Operations
//! - CRUD with one-level hierarchy checks
//! - Stock adjustment through the non-negative primitive
//! - Category, low-stock and name search views
//!
//! ## Catalog Shape
//! ```text
//! Grains (category, parent_id = None)
//!   ├── Basmati Rice   price 90.00  stock 40  min 10
//!   └── Brown Rice     price 75.00  stock  6  min 10   ← low stock
//! Dairy (category)
//!   └── Milk 1L        price 28.00  stock 24  min  6
//! ```

use chrono::Utc;
use tracing::{debug, info, warn};

use billbook_core::validation::{
    validate_name, validate_parent, validate_price_cents, validate_product_draft,
    validate_search_query, validate_stock_level,
};
use billbook_core::{Product, ProductDraft, ProductUpdate};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use crate::store::{keys, KvStore};

/// Repository for catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let rice = repo.add(draft).await?;
/// repo.adjust_stock(&rice.id, -5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    store: KvStore,
}

impl ProductRepository {
    pub fn new(store: KvStore) -> Self {
        ProductRepository { store }
    }

    /// Returns the whole catalog in stored order.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        self.store.load_list(keys::PRODUCTS).await
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    /// Adds a product with a fresh ID and creation time.
    ///
    /// ## Errors
    /// `Validation` for a blank name, negative numbers, or a parent that is
    /// unknown or not top-level.
    pub async fn add(&self, draft: ProductDraft) -> DbResult<Product> {
        validate_product_draft(&draft)?;

        let mut tx = self.store.begin().await?;
        let mut products: Vec<Product> = tx.load_list(keys::PRODUCTS).await?;

        if let Some(parent_id) = draft.parent_id.as_deref() {
            validate_parent(&products, None, parent_id)?;
        }

        let product = Product::from_draft(generate_id(), draft, Utc::now());
        products.push(product.clone());

        tx.save_list(keys::PRODUCTS, &products).await?;
        tx.commit().await?;

        info!(id = %product.id, name = %product.name, "Product added");
        Ok(product)
    }

    /// Merges the present fields into an existing product.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - the updated record
    /// * `Ok(None)` - no product with that ID; nothing written
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<Option<Product>> {
        let mut tx = self.store.begin().await?;
        let mut products: Vec<Product> = tx.load_list(keys::PRODUCTS).await?;

        let Some(index) = products.iter().position(|p| p.id == id) else {
            debug!(id = %id, "Update of unknown product ignored");
            return Ok(None);
        };

        if let Some(name) = update.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(price) = update.price {
            validate_price_cents(price.cents())?;
        }
        if let Some(min_stock) = update.min_stock {
            validate_stock_level("minStock", min_stock)?;
        }
        if let Some(Some(parent_id)) = update.parent_id.as_ref() {
            validate_parent(&products, Some(id), parent_id)?;
        }

        let product = &mut products[index];
        product.apply_update(update);
        let updated = product.clone();

        tx.save_list(keys::PRODUCTS, &products).await?;
        tx.commit().await?;

        debug!(id = %id, "Product updated");
        Ok(Some(updated))
    }

    /// Removes a product. Children of a removed category become top-level.
    ///
    /// ## Returns
    /// `true` if something was removed; an unknown ID is a no-op.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let mut tx = self.store.begin().await?;
        let mut products: Vec<Product> = tx.load_list(keys::PRODUCTS).await?;

        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            debug!(id = %id, "Delete of unknown product ignored");
            return Ok(false);
        }

        let mut demoted = 0;
        for child in products.iter_mut().filter(|p| p.parent_id.as_deref() == Some(id)) {
            child.parent_id = None;
            demoted += 1;
        }
        if demoted > 0 {
            warn!(id = %id, demoted, "Deleted category had products; moved them to top level");
        }

        tx.save_list(keys::PRODUCTS, &products).await?;
        tx.commit().await?;

        info!(id = %id, "Product deleted");
        Ok(true)
    }

    /// Changes stock by `delta` (negative for sales, positive for restocking).
    ///
    /// ## Returns
    /// * `Ok(Product)` - the product with its new stock
    /// * `Err(DbError::NotFound)` - unknown ID
    /// * `Err(DbError::Core(InsufficientStock))` - stock would go negative;
    ///   nothing written
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let mut tx = self.store.begin().await?;
        let mut products: Vec<Product> = tx.load_list(keys::PRODUCTS).await?;

        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DbError::not_found("Product", id))?;
        let stock = product.apply_stock_delta(delta)?;
        let adjusted = product.clone();

        tx.save_list(keys::PRODUCTS, &products).await?;
        tx.commit().await?;

        if adjusted.is_low_stock() {
            warn!(id = %id, stock, min_stock = adjusted.min_stock, "Product is low on stock");
        }
        Ok(adjusted)
    }

    /// Top-level nodes.
    pub async fn categories(&self) -> DbResult<Vec<Product>> {
        let products = self.list().await?;
        Ok(products.into_iter().filter(Product::is_category).collect())
    }

    /// Products filed under one category.
    pub async fn children_of(&self, parent_id: &str) -> DbResult<Vec<Product>> {
        let products = self.list().await?;
        Ok(products
            .into_iter()
            .filter(|p| p.parent_id.as_deref() == Some(parent_id))
            .collect())
    }

    /// Sellable products at or below their minimum stock.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = self.list().await?;
        Ok(products
            .into_iter()
            .filter(|p| !p.is_category() && p.is_low_stock())
            .collect())
    }

    /// Case-insensitive name substring search. Blank returns everything.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let needle = validate_search_query(query)?.to_lowercase();
        let products = self.list().await?;
        Ok(products
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use billbook_core::{CoreError, Money};

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    fn draft(name: &str, parent: Option<&str>, stock: i64) -> ProductDraft {
        ProductDraft {
            name: name.into(),
            parent_id: parent.map(str::to_string),
            price: Money::from_cents(9000),
            stock,
            min_stock: 3,
            unit: "kg".into(),
        }
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let repo = repo().await;
        let grains = repo.add(draft("Grains", None, 0)).await.unwrap();
        let rice = repo.add(draft("Rice", Some(grains.id.as_str()), 10)).await.unwrap();

        let found = repo.get_by_id(&rice.id).await.unwrap().unwrap();
        assert_eq!(found, rice);
        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_bad_hierarchy() {
        let repo = repo().await;
        let grains = repo.add(draft("Grains", None, 0)).await.unwrap();
        let rice = repo.add(draft("Rice", Some(grains.id.as_str()), 10)).await.unwrap();

        let err = repo.add(draft("Brown", Some(rice.id.as_str()), 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = repo.add(draft("Orphan", Some("ghost"), 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stock_scenario() {
        let repo = repo().await;
        let rice = repo.add(draft("Rice", None, 10)).await.unwrap();

        let after = repo.adjust_stock(&rice.id, -5).await.unwrap();
        assert_eq!(after.stock(), 5);

        let err = repo.adjust_stock(&rice.id, -10).await.unwrap_err();
        assert!(err.is_insufficient_stock());
        assert_eq!(repo.get_by_id(&rice.id).await.unwrap().unwrap().stock(), 5);

        let err = repo.adjust_stock("ghost", 1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stock_never_negative_under_any_sequence() {
        let repo = repo().await;
        let rice = repo.add(draft("Rice", None, 3)).await.unwrap();

        for delta in [-2, -2, 5, -7, -6, 1, -1, -1] {
            let _ = repo.adjust_stock(&rice.id, delta).await;
            let stock = repo.get_by_id(&rice.id).await.unwrap().unwrap().stock();
            assert!(stock >= 0);
        }
    }

    #[tokio::test]
    async fn test_update_merges_and_ignores_unknown() {
        let repo = repo().await;
        let rice = repo.add(draft("Rice", None, 10)).await.unwrap();

        let updated = repo
            .update(
                &rice.id,
                ProductUpdate {
                    price: Some(Money::from_cents(9500)),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price.cents(), 9500);
        assert_eq!(updated.name, "Rice");
        assert_eq!(updated.stock(), 10);

        let none = repo.update("ghost", ProductUpdate::default()).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_update_of_unknown_product_skips_validation() {
        let repo = repo().await;

        let dangling_parent = ProductUpdate {
            parent_id: Some(Some("nowhere".into())),
            ..Default::default()
        };
        assert!(repo.update("ghost", dangling_parent).await.unwrap().is_none());

        let blank_name = ProductUpdate {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(repo.update("ghost", blank_name).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_category_with_children_cannot_be_nested() {
        let repo = repo().await;
        let grains = repo.add(draft("Grains", None, 0)).await.unwrap();
        let dairy = repo.add(draft("Dairy", None, 0)).await.unwrap();
        repo.add(draft("Rice", Some(grains.id.as_str()), 1)).await.unwrap();

        let err = repo
            .update(
                &grains.id,
                ProductUpdate {
                    parent_id: Some(Some(dairy.id.clone())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_demotes_children() {
        let repo = repo().await;
        let grains = repo.add(draft("Grains", None, 0)).await.unwrap();
        let rice = repo.add(draft("Rice", Some(grains.id.as_str()), 1)).await.unwrap();

        assert!(repo.delete(&grains.id).await.unwrap());
        assert!(!repo.delete(&grains.id).await.unwrap());

        let rice = repo.get_by_id(&rice.id).await.unwrap().unwrap();
        assert!(rice.is_category());
    }

    #[tokio::test]
    async fn test_views() {
        let repo = repo().await;
        let grains = repo.add(draft("Grains", None, 0)).await.unwrap();
        repo.add(draft("Basmati Rice", Some(grains.id.as_str()), 40)).await.unwrap();
        repo.add(draft("Brown Rice", Some(grains.id.as_str()), 2)).await.unwrap();
        repo.add(draft("Dairy", None, 0)).await.unwrap();

        assert_eq!(repo.categories().await.unwrap().len(), 2);
        assert_eq!(repo.children_of(&grains.id).await.unwrap().len(), 2);

        let low = repo.low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Brown Rice");

        assert_eq!(repo.search("RICE").await.unwrap().len(), 2);
        assert_eq!(repo.search("  ").await.unwrap().len(), 4);
    }
}
