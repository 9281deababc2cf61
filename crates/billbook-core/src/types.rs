//! # Domain Types
//!
//! Core domain types used throughout Billbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  parent_id      │   │  name           │   │  invoice_number │       │
//! │  │  price, stock   │   │  phone          │   │  items (snap)   │       │
//! │  │  min_stock      │   │  address        │   │  totals         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Percent      │   │   BillDraft     │   │ InvoiceNumber   │       │
//! │  │  bps (i64)      │   │  customer_id    │   │  INV-1001       │       │
//! │  │  1800 = 18%     │   │  lines          │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has an immutable `id` (UUID v4). Bills additionally carry a
//! sequenced, human-facing invoice number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::INVOICE_PREFIX;

// =============================================================================
// Percent
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18%. Signed: the operator is
/// trusted, negative or absurd percentages are taken as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(i64);

impl Percent {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a decimal percentage (18.0 = 18%).
    pub fn from_percentage(pct: f64) -> Self {
        Percent((pct * 100.0).round() as i64)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog node: a top-level category or a sellable child product.
///
/// ## Stock Invariant
/// `stock >= 0` at all times. The field is private; the only way to change
/// it after creation is [`Product::apply_stock_delta`], which rejects any
/// change that would go negative.
///
/// ## Hierarchy
/// Exactly one level: a product with a parent is never itself a parent.
/// Price and stock are meaningful on child products only, by convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Parent category, `None` for top-level nodes.
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Unit price in cents.
    #[serde(default)]
    pub price: Money,

    /// Current stock level, never negative.
    #[serde(default)]
    stock: i64,

    /// Threshold at or below which the product counts as low stock.
    #[serde(default)]
    pub min_stock: i64,

    /// Unit of measure label ("pcs", "kg", ...).
    #[serde(default)]
    pub unit: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Builds a product from a validated draft.
    pub fn from_draft(id: String, draft: ProductDraft, created_at: DateTime<Utc>) -> Self {
        Product {
            id,
            name: draft.name.trim().to_string(),
            parent_id: draft.parent_id,
            price: draft.price,
            stock: draft.stock.max(0),
            min_stock: draft.min_stock,
            unit: draft.unit,
            created_at,
        }
    }

    /// Current stock level.
    #[inline]
    pub fn stock(&self) -> i64 {
        self.stock
    }

    /// Applies a stock change, refusing to go below zero.
    ///
    /// ## Returns
    /// * `Ok(new_stock)` - change committed to this value
    /// * `Err(CoreError::InsufficientStock)` - stock left unchanged
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::{Product, ProductDraft};
    ///
    /// let draft = ProductDraft { name: "Rice".into(), stock: 10, ..Default::default() };
    /// let mut rice = Product::from_draft("p1".into(), draft, chrono::Utc::now());
    /// assert_eq!(rice.apply_stock_delta(-5).unwrap(), 5);
    /// assert!(rice.apply_stock_delta(-10).is_err());
    /// assert_eq!(rice.stock(), 5);
    /// ```
    pub fn apply_stock_delta(&mut self, delta: i64) -> CoreResult<i64> {
        let next = self.stock.checked_add(delta).unwrap_or(i64::MIN);
        if next < 0 {
            return Err(CoreError::insufficient_stock(
                self.name.clone(),
                self.stock,
                delta.saturating_neg(),
            ));
        }
        self.stock = next;
        Ok(next)
    }

    /// Replaces the stock level wholesale.
    ///
    /// Only the import pipeline does this, after checking the value.
    pub(crate) fn set_stock(&mut self, stock: i64) {
        debug_assert!(stock >= 0);
        self.stock = stock.max(0);
    }

    /// True for top-level (category) nodes.
    #[inline]
    pub fn is_category(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True when stock has fallen to or below the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Merges the present fields of an update into this record.
    ///
    /// Stock is deliberately absent from [`ProductUpdate`].
    pub fn apply_update(&mut self, update: ProductUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(parent_id) = update.parent_id {
            self.parent_id = parent_id;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(min_stock) = update.min_stock {
            self.min_stock = min_stock;
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
    }
}

/// Fields supplied when adding a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub unit: String,
}

/// Partial product update; absent fields are left untouched.
///
/// `parent_id` distinguishes "absent" (`None`) from "clear the parent"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub parent_id: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Maps a present JSON field (including `null`) to `Some(..)`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Customer
// =============================================================================

/// A customer in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Natural secondary key used to de-duplicate imports.
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Builds a customer from a validated draft.
    pub fn from_draft(id: String, draft: CustomerDraft, created_at: DateTime<Utc>) -> Self {
        Customer {
            id,
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            address: draft.address,
            created_at,
        }
    }

    /// Merges the present fields of an update into this record.
    pub fn apply_update(&mut self, update: CustomerUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(address) = update.address {
            self.address = address;
        }
    }

    /// Case-insensitive name substring or phone substring match.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.phone.to_lowercase().contains(&needle)
    }
}

/// Fields supplied when adding a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerDraft {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Partial customer update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// =============================================================================
// Bill Item
// =============================================================================

/// A line item embedded in a bill.
///
/// Uses the snapshot pattern: product name and price are frozen at the time
/// of sale so the bill stays printable after the product changes or goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Unit price at time of sale (frozen).
    pub price: Money,
    pub quantity: i64,
    /// `quantity * price`.
    pub total: Money,
}

impl BillItem {
    /// Creates an item and computes its line total.
    ///
    /// Fails with `TooLarge` when `quantity * price` overflows.
    pub fn new(
        product_id: String,
        product_name: String,
        price: Money,
        quantity: i64,
    ) -> CoreResult<Self> {
        let total = price
            .checked_mul_quantity(quantity)
            .ok_or_else(|| ValidationError::too_large("line total"))?;

        Ok(BillItem {
            product_id,
            product_name,
            price,
            quantity,
            total,
        })
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A committed invoice.
///
/// ## Invariant
/// `total == (subtotal - discount_amount) + tax_amount`, computed once at
/// creation and never recomputed from live product data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bill {
    pub id: String,
    /// Human-facing sequenced number, e.g. `INV-1001`.
    pub invoice_number: String,
    pub customer_id: String,
    /// Customer name at time of sale (frozen).
    pub customer_name: String,
    pub items: Vec<BillItem>,
    pub subtotal: Money,
    pub discount_percent: Percent,
    pub discount_amount: Money,
    pub tax_percent: Percent,
    pub tax_amount: Money,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Applies an administrative correction.
    ///
    /// Only the customer reference can be replaced; items, totals and
    /// stock are never touched.
    pub fn apply_update(&mut self, update: BillUpdate) {
        if let Some(customer_id) = update.customer_id {
            self.customer_id = customer_id;
        }
        if let Some(customer_name) = update.customer_name {
            self.customer_name = customer_name;
        }
    }
}

/// Administrative correction of a committed bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillUpdate {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

// =============================================================================
// Bill Draft
// =============================================================================

/// One requested line of a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillLine {
    pub product_id: String,
    pub quantity: i64,
    /// Price frozen when the line entered the cart; the catalog price is
    /// used when absent.
    #[serde(default)]
    pub price: Option<Money>,
}

/// A proposed bill, as handed to the billing engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillDraft {
    pub customer_id: String,
    pub lines: Vec<BillLine>,
    #[serde(default)]
    pub discount_percent: Percent,
    #[serde(default)]
    pub tax_percent: Percent,
}

// =============================================================================
// Invoice Number
// =============================================================================

/// A sequenced invoice number, displayed as `INV-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvoiceNumber(u64);

impl InvoiceNumber {
    #[inline]
    pub const fn new(value: u64) -> Self {
        InvoiceNumber(value)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The number that follows this one.
    #[inline]
    pub const fn next(&self) -> Self {
        InvoiceNumber(self.0 + 1)
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", INVOICE_PREFIX, self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
