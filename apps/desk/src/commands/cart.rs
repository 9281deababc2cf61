//! # Cart Commands
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Customer │────►│ Committed│       │
//! │  │  Cart    │     │          │     │ + Rates  │     │   Bill   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                 │              │
//! │                   addToCart                        checkoutCart        │
//! │                   updateCartItem                   (cart cleared,      │
//! │                   removeFromCart                    draft discarded)   │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clearCart ───────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::{Bill, Percent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::draft::discard_draft;
use crate::error::ApiError;
use crate::state::{Cart, CartItem, CartState, CartTotals, DbState};

/// Cart response including items and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub customer_id: Option<String>,
    pub discount_percent: Percent,
    pub tax_percent: Percent,
    pub totals: CartTotals,
}

impl TryFrom<&Cart> for CartResponse {
    type Error = ApiError;

    fn try_from(cart: &Cart) -> Result<Self, ApiError> {
        Ok(CartResponse {
            items: cart.items.clone(),
            customer_id: cart.customer_id.clone(),
            discount_percent: cart.discount_percent,
            tax_percent: cart.tax_percent,
            totals: CartTotals::try_from(cart)?,
        })
    }
}

pub fn get_cart(cart: &CartState) -> Result<CartResponse, ApiError> {
    cart.with_cart(|c| CartResponse::try_from(c))
}

/// Adds a product to the cart with its current name and price.
///
/// Stock is not checked here; the bill is checked as a whole on checkout.
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    product_id: &str,
    quantity: Option<i64>,
) -> Result<CartResponse, ApiError> {
    let quantity = quantity.unwrap_or(1);
    debug!(product_id = %product_id, quantity, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    cart.with_cart_mut(|c| {
        c.add_item(&product, quantity).map_err(ApiError::cart)?;
        CartResponse::try_from(&*c)
    })
}

/// Quantity 0 removes the item.
pub fn update_cart_item(
    cart: &CartState,
    product_id: &str,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, quantity, "update_cart_item command");

    cart.with_cart_mut(|c| {
        c.update_quantity(product_id, quantity)
            .map_err(ApiError::cart)?;
        CartResponse::try_from(&*c)
    })
}

pub fn remove_from_cart(cart: &CartState, product_id: &str) -> Result<CartResponse, ApiError> {
    cart.with_cart_mut(|c| {
        c.remove_item(product_id).map_err(ApiError::cart)?;
        CartResponse::try_from(&*c)
    })
}

pub fn clear_cart(cart: &CartState) -> Result<CartResponse, ApiError> {
    cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::try_from(&*c)
    })
}

/// Sets or clears (`None`) the customer. The customer must exist.
pub async fn set_cart_customer(
    db: &DbState,
    cart: &CartState,
    customer_id: Option<String>,
) -> Result<CartResponse, ApiError> {
    if let Some(id) = customer_id.as_deref() {
        if db.inner().customers().get_by_id(id).await?.is_none() {
            return Err(ApiError::not_found("Customer", id));
        }
    }

    cart.with_cart_mut(|c| {
        c.set_customer(customer_id);
        CartResponse::try_from(&*c)
    })
}

pub fn set_cart_discount(cart: &CartState, percent: f64) -> Result<CartResponse, ApiError> {
    cart.with_cart_mut(|c| {
        c.set_discount(Percent::from_percentage(percent))
            .map_err(ApiError::cart)?;
        CartResponse::try_from(&*c)
    })
}

pub fn set_cart_tax(cart: &CartState, percent: f64) -> Result<CartResponse, ApiError> {
    cart.with_cart_mut(|c| {
        c.set_tax(Percent::from_percentage(percent))
            .map_err(ApiError::cart)?;
        CartResponse::try_from(&*c)
    })
}

/// Commits the cart as a bill.
///
/// ## Flow
/// ```text
/// cart ──► to_bill_draft() ──► BillingEngine::create_bill()
///                                   │
///                  error ◄──────────┤ cart untouched, stock untouched
///                                   ▼
///                         cart.clear() ──► discard_draft()
/// ```
pub async fn checkout_cart(db: &DbState, cart: &CartState) -> Result<Bill, ApiError> {
    let draft = cart
        .with_cart(|c| c.to_bill_draft())
        .map_err(ApiError::cart)?;

    let bill = db.inner().billing().create_bill(draft).await?;

    cart.with_cart_mut(|c| c.clear());
    if let Err(e) = discard_draft(&db.inner().store()).await {
        // The bill is committed; a stale draft is overwritten by the next autosave.
        warn!(?e, "Failed to discard bill draft after checkout");
    }

    info!(invoice_number = %bill.invoice_number, "Checkout complete");
    Ok(bill)
}
