//! # Cart State
//!
//! The bill being rung up at the counter. Nothing here touches stock; the
//! cart becomes a [`BillDraft`] and the billing engine does the checking.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Caller Action            Command                 Cart State Change     │
//! │  ─────────────            ───────                 ─────────────────     │
//! │                                                                         │
//! │  Pick Product ───────────► addToCart ───────────► items.push(item)     │
//! │                                                                         │
//! │  Change Quantity ────────► updateCartItem ──────► items[i].qty = n     │
//! │                                                                         │
//! │  Click Remove ───────────► removeFromCart ──────► items.remove(i)      │
//! │                                                                         │
//! │  Pick Customer ──────────► setCartCustomer ─────► customer_id = id     │
//! │                                                                         │
//! │  Edit Discount / GST ────► setCartDiscount/Tax ─► percent = p          │
//! │                                                                         │
//! │  Save Bill ──────────────► checkoutCart ────────► to_bill_draft()      │
//! │                                                   then clear()          │
//! │                                                                         │
//! │  NOTE: Every write bumps the revision so the autosave task knows       │
//! │        whether the draft is stale.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use billbook_core::billing::BillTotals;
use billbook_core::validation::{validate_cart_size, validate_quantity};
use billbook_core::{BillDraft, BillItem, BillLine, CoreError, CoreResult, Money, Percent, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item in the cart.
///
/// Name and price are frozen when the product is added. A later catalog
/// edit does not change what this cart bills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Unit price at time of adding (frozen)
    pub unit_price: Money,

    pub quantity: i64,

    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            added_at: Utc::now(),
        }
    }

    fn to_bill_item(&self) -> CoreResult<BillItem> {
        BillItem::new(
            self.product_id.clone(),
            self.name.clone(),
            self.unit_price,
            self.quantity,
        )
    }
}

/// The cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product again
///   increases its quantity)
/// - Every quantity is > 0 (setting 0 removes the item)
/// - At most `MAX_CART_ITEMS` distinct products
/// - [`Cart::totals`] succeeds: a change that would overflow an amount is
///   rejected and the cart left as it was
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,

    #[serde(default)]
    pub customer_id: Option<String>,

    pub discount_percent: Percent,

    pub tax_percent: Percent,

    /// When the cart was created/last cleared
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new(Percent::zero(), Percent::zero())
    }
}

impl Cart {
    /// Creates an empty cart with the given starting percentages.
    pub fn new(discount_percent: Percent, tax_percent: Percent) -> Self {
        Cart {
            items: Vec::new(),
            customer_id: None,
            discount_percent,
            tax_percent,
            created_at: Utc::now(),
        }
    }

    /// Adds a product or increases its quantity if already present.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> Result<(), String> {
        validate_quantity(quantity).map_err(|e| e.to_string())?;

        let mut next = self.clone();
        if let Some(item) = next.items.iter_mut().find(|i| i.product_id == product.id) {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| "Quantity is too large".to_string())?;
        } else {
            validate_cart_size(next.items.len()).map_err(|e| e.to_string())?;
            next.items.push(CartItem::from_product(product, quantity));
        }

        self.replace_with(next)
    }

    /// Sets the quantity of an item. Quantity 0 removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), String> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        validate_quantity(quantity).map_err(|e| e.to_string())?;

        let mut next = self.clone();
        match next.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => item.quantity = quantity,
            None => return Err(format!("Product {} not in cart", product_id)),
        }

        self.replace_with(next)
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<(), String> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(format!("Product {} not in cart", product_id))
        } else {
            Ok(())
        }
    }

    /// Empties the cart and forgets the customer. Percentages are kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.customer_id = None;
        self.created_at = Utc::now();
    }

    pub fn set_customer(&mut self, customer_id: Option<String>) {
        self.customer_id = customer_id.filter(|id| !id.trim().is_empty());
    }

    /// Any percentage is accepted as long as the totals still compute.
    pub fn set_discount(&mut self, percent: Percent) -> Result<(), String> {
        let mut next = self.clone();
        next.discount_percent = percent;
        self.replace_with(next)
    }

    pub fn set_tax(&mut self, percent: Percent) -> Result<(), String> {
        let mut next = self.clone();
        next.tax_percent = percent;
        self.replace_with(next)
    }

    fn replace_with(&mut self, next: Cart) -> Result<(), String> {
        next.totals().map_err(|e| e.to_string())?;
        *self = next;
        Ok(())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |n, i| n.saturating_add(i.quantity))
    }

    /// Same arithmetic the billing engine applies on commit.
    pub fn totals(&self) -> CoreResult<BillTotals> {
        let items = self
            .items
            .iter()
            .map(CartItem::to_bill_item)
            .collect::<CoreResult<Vec<BillItem>>>()?;
        BillTotals::compute(&items, self.discount_percent, self.tax_percent)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Converts the cart into a draft for the billing engine.
    ///
    /// Each line carries its frozen price.
    pub fn to_bill_draft(&self) -> Result<BillDraft, String> {
        if self.is_empty() {
            return Err("Cart is empty".to_string());
        }
        let customer_id = self
            .customer_id
            .clone()
            .ok_or_else(|| "Select a customer before saving the bill".to_string())?;

        Ok(BillDraft {
            customer_id,
            lines: self
                .items
                .iter()
                .map(|i| BillLine {
                    product_id: i.product_id.clone(),
                    quantity: i.quantity,
                    price: Some(i.unit_price),
                })
                .collect(),
            discount_percent: self.discount_percent,
            tax_percent: self.tax_percent,
        })
    }
}

/// Cart totals summary for replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

impl TryFrom<&Cart> for CartTotals {
    type Error = CoreError;

    fn try_from(cart: &Cart) -> CoreResult<Self> {
        let totals = cart.totals()?;
        Ok(CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            total: totals.total,
        })
    }
}

/// Shared cart state.
///
/// ## Thread Safety
/// `Arc<Mutex<Cart>>`: the command worker writes, the autosave task reads.
/// Cart operations are short and mostly writes, so a plain mutex.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
    revision: Arc<AtomicU64>,
}

impl CartState {
    pub fn new(cart: Cart) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(cart)),
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_item(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.lock();
        let result = f(&mut cart);
        self.revision.fetch_add(1, Ordering::SeqCst);
        result
    }

    /// Copy of the cart with the revision it was taken at.
    pub fn snapshot(&self) -> (Cart, u64) {
        let cart = self.lock();
        (cart.clone(), self.revision.load(Ordering::SeqCst))
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // A panic while holding the lock leaves a usable cart behind.
        self.cart
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new(Cart::default())
    }
}
