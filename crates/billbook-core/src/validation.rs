//! # Validation Module
//!
//! Input validation utilities for Billbook.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command bus (desk app)                                       │
//! │  └── Type validation (serde deserialization of the command)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repositories / billing engine (billbook-db)                  │
//! │  └── THIS MODULE: business rule validation before any write            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Stock primitive                                              │
//! │  └── Product::apply_stock_delta refuses negative stock                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Import rows run through the same validators; a failure there becomes a
//! row warning instead of failing the operation.

use crate::error::ValidationError;
use crate::types::{CustomerDraft, Product, ProductDraft};
use crate::MAX_CART_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 32;
const MAX_QUERY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product or customer name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use billbook_core::validation::validate_name;
///
/// assert!(validate_name("Basmati Rice").is_ok());
/// assert!(validate_name("   ").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// Blank is allowed (walk-in customers). Otherwise only digits, spaces and
/// `+-()` are accepted.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.len() > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: MAX_PHONE_LEN,
        });
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces and + - ( )".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string. Empty is allowed and means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested sale quantity.
///
/// ## User Workflow
/// ```text
/// Cart: Add Item, quantity 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty <= 0? → Error: "quantity must be positive"
///      │
///      └── OK → stock check happens in the billing engine
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (categories, free items).
///
/// ```rust
/// use billbook_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(9000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    non_negative("price", cents)
}

/// Validates an initial stock level or minimum stock threshold.
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    non_negative(field, value)
}

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates every field of a new product.
pub fn validate_product_draft(draft: &ProductDraft) -> ValidationResult<()> {
    validate_name(&draft.name)?;
    validate_price_cents(draft.price.cents())?;
    validate_stock_level("stock", draft.stock)?;
    validate_stock_level("minStock", draft.min_stock)?;
    Ok(())
}

/// Validates every field of a new customer.
pub fn validate_customer_draft(draft: &CustomerDraft) -> ValidationResult<()> {
    validate_name(&draft.name)?;
    validate_phone(&draft.phone)?;
    Ok(())
}

// =============================================================================
// Hierarchy Validator
// =============================================================================

/// Validates that `product_id` may sit under `parent_id`.
///
/// ## Rules
/// ```text
///   Category (parent_id = None)
///     ├── Product A   ✅
///     └── Product B   ✅
///           └── X     ❌ parent is not top-level
///
///   Category ──► Other Category   ❌ a node with children cannot move
///   Product  ──► itself           ❌
///   Product  ──► unknown id       ❌
/// ```
///
/// `product_id` is `None` for a product that does not exist yet.
pub fn validate_parent(
    products: &[Product],
    product_id: Option<&str>,
    parent_id: &str,
) -> ValidationResult<()> {
    if product_id == Some(parent_id) {
        return Err(ValidationError::hierarchy("a product cannot be its own parent"));
    }

    let parent = products
        .iter()
        .find(|p| p.id == parent_id)
        .ok_or_else(|| ValidationError::hierarchy(format!("parent {} does not exist", parent_id)))?;

    if !parent.is_category() {
        return Err(ValidationError::hierarchy(format!(
            "{} is not a top-level category",
            parent.name
        )));
    }

    if let Some(id) = product_id {
        if products.iter().any(|p| p.parent_id.as_deref() == Some(id)) {
            return Err(ValidationError::hierarchy(
                "a category with products cannot be nested",
            ));
        }
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more distinct line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::TooLong {
            field: "cart".to_string(),
            max: MAX_CART_ITEMS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::Utc;

    fn node(id: &str, parent: Option<&str>) -> Product {
        let draft = ProductDraft {
            name: format!("node {}", id),
            parent_id: parent.map(str::to_string),
            ..Default::default()
        };
        Product::from_draft(id.to_string(), draft, Utc::now())
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Basmati Rice").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("+91 (98765) 43210").is_ok());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_product_draft() {
        let mut draft = ProductDraft {
            name: "Rice".into(),
            price: Money::from_cents(100),
            stock: 5,
            ..Default::default()
        };
        assert!(validate_product_draft(&draft).is_ok());

        draft.stock = -1;
        assert_eq!(
            validate_product_draft(&draft),
            Err(ValidationError::Negative {
                field: "stock".into()
            })
        );
    }

    #[test]
    fn test_validate_parent() {
        let products = vec![node("cat", None), node("p1", Some("cat")), node("lonely", None)];

        assert!(validate_parent(&products, None, "cat").is_ok());
        assert!(validate_parent(&products, Some("lonely"), "cat").is_ok());

        // Unknown parent, self parent, parent not top-level
        assert!(validate_parent(&products, None, "ghost").is_err());
        assert!(validate_parent(&products, Some("cat"), "cat").is_err());
        assert!(validate_parent(&products, None, "p1").is_err());

        // A category with children cannot be moved under another category
        assert!(validate_parent(&products, Some("cat"), "lonely").is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }
}
