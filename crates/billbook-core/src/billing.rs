//! # Billing Math and Stock Staging
//!
//! The pure half of the billing transaction engine. `billbook-db` loads the
//! catalog inside a store transaction, hands it to [`stage_bill`], and
//! persists whatever this module returns.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BillDraft ──► stage_bill ──────────────► StagedBill ──► Bill          │
//! │                  │                          │                          │
//! │                  ├─ 1. validate every line  │  into_bill(id, INV-n,    │
//! │                  │     (nothing mutated)    │            customer, now)│
//! │                  ├─ 2. compute totals       │                          │
//! │                  └─ 3. deduct stock         │                          │
//! │                                                                         │
//! │  Bill ──► restore_stock ──► stock given back, bill removed by caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//! subtotal        = Σ quantity × price
//! discount_amount = subtotal × discount%
//! tax_amount      = (subtotal - discount_amount) × tax%
//! total           = (subtotal - discount_amount) + tax_amount
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Bill, BillDraft, BillItem, Customer, InvoiceNumber, Percent, Product};
use crate::validation::{validate_price_cents, validate_quantity};

// =============================================================================
// Totals
// =============================================================================

/// Monetary summary of a set of bill items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BillTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

impl BillTotals {
    /// Computes totals. Each derived amount is rounded to the cent once.
    ///
    /// Fails with `TooLarge` instead of wrapping when an amount stops
    /// fitting in an `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::billing::BillTotals;
    /// use billbook_core::{BillItem, Money, Percent};
    ///
    /// let items = vec![
    ///     BillItem::new("a".into(), "A".into(), Money::from_cents(10000), 3).unwrap(),
    ///     BillItem::new("b".into(), "B".into(), Money::from_cents(5000), 1).unwrap(),
    /// ];
    /// let totals =
    ///     BillTotals::compute(&items, Percent::from_bps(1000), Percent::from_bps(1800)).unwrap();
    /// assert_eq!(totals.total.cents(), 37170);
    /// ```
    pub fn compute(items: &[BillItem], discount: Percent, tax: Percent) -> CoreResult<Self> {
        let too_large = || CoreError::from(ValidationError::too_large("bill total"));

        let subtotal = items
            .iter()
            .try_fold(Money::zero(), |sum, item| sum.checked_add(item.total))
            .ok_or_else(too_large)?;
        let discount_amount = subtotal.percentage(discount).ok_or_else(too_large)?;
        let taxable = subtotal.checked_sub(discount_amount).ok_or_else(too_large)?;
        let tax_amount = taxable.percentage(tax).ok_or_else(too_large)?;
        let total = taxable.checked_add(tax_amount).ok_or_else(too_large)?;

        Ok(BillTotals {
            subtotal,
            discount_amount,
            tax_amount,
            total,
        })
    }
}

// =============================================================================
// Staging
// =============================================================================

/// A validated bill whose stock deductions have been applied to the
/// caller's product list but not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedBill {
    pub items: Vec<BillItem>,
    pub discount_percent: Percent,
    pub tax_percent: Percent,
    pub totals: BillTotals,
}

impl StagedBill {
    /// Stamps identity, invoice number and customer snapshot onto the bill.
    pub fn into_bill(
        self,
        id: String,
        invoice_number: InvoiceNumber,
        customer: &Customer,
        created_at: DateTime<Utc>,
    ) -> Bill {
        Bill {
            id,
            invoice_number: invoice_number.to_string(),
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            items: self.items,
            subtotal: self.totals.subtotal,
            discount_percent: self.discount_percent,
            discount_amount: self.totals.discount_amount,
            tax_percent: self.tax_percent,
            tax_amount: self.totals.tax_amount,
            total: self.totals.total,
            created_at,
        }
    }
}

/// Validates a draft against the catalog and deducts its stock.
///
/// Every line is checked before any product is touched. Repeated lines for
/// one product are checked against the stock as a combined quantity. On
/// error `products` is unchanged.
///
/// ## Errors
/// - `EmptyBill` - the draft has no lines
/// - `Validation` - a line quantity is zero or negative, a supplied line
///   price is negative, or an amount overflows
/// - `ProductNotFound` - a line names an unknown product
/// - `InsufficientStock` - combined quantity exceeds available stock
pub fn stage_bill(products: &mut [Product], draft: &BillDraft) -> CoreResult<StagedBill> {
    if draft.lines.is_empty() {
        return Err(CoreError::EmptyBill);
    }

    // Phase 1: validate without mutating
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(products.len());
    for (i, product) in products.iter().enumerate() {
        index.insert(product.id.as_str(), i);
    }

    let mut requested: HashMap<usize, i64> = HashMap::new();
    let mut resolved = Vec::with_capacity(draft.lines.len());

    for line in &draft.lines {
        validate_quantity(line.quantity)?;
        if let Some(price) = line.price {
            validate_price_cents(price.cents())?;
        }
        let &i = index
            .get(line.product_id.as_str())
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let wanted = requested.entry(i).or_insert(0);
        *wanted = wanted.saturating_add(line.quantity);

        let product = &products[i];
        if product.stock() < *wanted {
            return Err(CoreError::insufficient_stock(
                product.name.clone(),
                product.stock(),
                *wanted,
            ));
        }
        resolved.push(i);
    }

    // Phase 2: snapshot items and totals, then deduct
    let items = draft
        .lines
        .iter()
        .zip(&resolved)
        .map(|(line, &i)| {
            let product = &products[i];
            BillItem::new(
                product.id.clone(),
                product.name.clone(),
                line.price.unwrap_or(product.price),
                line.quantity,
            )
        })
        .collect::<CoreResult<Vec<BillItem>>>()?;

    let totals = BillTotals::compute(&items, draft.discount_percent, draft.tax_percent)?;

    for (&i, &quantity) in &requested {
        products[i].apply_stock_delta(-quantity)?;
    }

    Ok(StagedBill {
        items,
        discount_percent: draft.discount_percent,
        tax_percent: draft.tax_percent,
        totals,
    })
}

/// Gives a bill's quantities back to the catalog.
///
/// Restoration is unconditional. Items whose product no longer exists are
/// skipped and their product ids returned.
pub fn restore_stock(products: &mut [Product], bill: &Bill) -> CoreResult<Vec<String>> {
    let mut skipped = Vec::new();

    for item in &bill.items {
        match products.iter_mut().find(|p| p.id == item.product_id) {
            Some(product) => {
                product.apply_stock_delta(item.quantity)?;
            }
            None => skipped.push(item.product_id.clone()),
        }
    }

    Ok(skipped)
}

// =============================================================================
// Unit Tests
// =============================================================================
