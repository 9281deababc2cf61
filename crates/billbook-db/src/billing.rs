//! # Billing Transaction Engine
//!
//! Turns a [`BillDraft`] into a committed [`Bill`], and reverses it.
//!
//! ## create_bill
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                 │
//! │    load products                                                       │
//! │    stage_bill(products, draft)  ── validate ALL lines, then deduct     │
//! │    load customers, resolve draft.customer_id                           │
//! │    allocate invoice number (counter + 1)                               │
//! │    append bill                                                          │
//! │    save products, counter, bills                                       │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any error before COMMIT: the transaction is dropped and rolled back,  │
//! │  stock, counter and ledger are exactly as before.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bill States
//! `Draft ──► Committed ──► [Deleted]`. A committed bill is never
//! re-validated; [`BillingEngine::update_bill`] only corrects the customer.

use chrono::Utc;
use tracing::{debug, info, warn};

use billbook_core::billing::{restore_stock, stage_bill};
use billbook_core::{Bill, BillDraft, BillUpdate, CoreError, Customer, Product};

use crate::error::DbResult;
use crate::repository::generate_id;
use crate::repository::invoice::InvoiceSequencer;
use crate::store::{keys, KvStore};

/// Creates, lists, corrects and reverses bills.
#[derive(Debug, Clone)]
pub struct BillingEngine {
    store: KvStore,
}

impl BillingEngine {
    pub fn new(store: KvStore) -> Self {
        BillingEngine { store }
    }

    /// Commits a bill: stock deduction, invoice number and ledger entry
    /// happen together or not at all.
    ///
    /// ## Errors
    /// - `EmptyBill`, `Validation` - malformed draft
    /// - `ProductNotFound` - a line names an unknown product
    /// - `InsufficientStock` - first line (in draft order) that can't be met
    /// - `CustomerNotFound` - unknown customer
    pub async fn create_bill(&self, draft: BillDraft) -> DbResult<Bill> {
        debug!(
            customer_id = %draft.customer_id,
            lines = draft.lines.len(),
            "Creating bill"
        );

        let mut tx = self.store.begin().await?;

        let mut products: Vec<Product> = tx.load_list(keys::PRODUCTS).await?;
        let staged = stage_bill(&mut products, &draft)?;

        let customers: Vec<Customer> = tx.load_list(keys::CUSTOMERS).await?;
        let customer = customers
            .iter()
            .find(|c| c.id == draft.customer_id)
            .ok_or_else(|| CoreError::CustomerNotFound(draft.customer_id.clone()))?;

        let invoice_number = InvoiceSequencer::allocate(&mut tx).await?;
        let bill = staged.into_bill(generate_id(), invoice_number, customer, Utc::now());

        let mut bills: Vec<Bill> = tx.load_list(keys::BILLS).await?;
        bills.push(bill.clone());

        tx.save_list(keys::PRODUCTS, &products).await?;
        tx.save_list(keys::BILLS, &bills).await?;
        tx.commit().await?;

        info!(
            id = %bill.id,
            invoice_number = %bill.invoice_number,
            total = %bill.total,
            "Bill committed"
        );
        Ok(bill)
    }

    /// Deletes a bill and gives its stock back.
    ///
    /// Restoration is unconditional. Items whose product has since been
    /// deleted are skipped with a warning.
    ///
    /// ## Returns
    /// `true` if a bill was removed; an unknown ID is a no-op.
    pub async fn delete_bill(&self, id: &str) -> DbResult<bool> {
        let mut tx = self.store.begin().await?;

        let mut bills: Vec<Bill> = tx.load_list(keys::BILLS).await?;
        let Some(position) = bills.iter().position(|b| b.id == id) else {
            debug!(id = %id, "Delete of unknown bill ignored");
            return Ok(false);
        };
        let bill = bills.remove(position);

        let mut products: Vec<Product> = tx.load_list(keys::PRODUCTS).await?;
        let skipped = restore_stock(&mut products, &bill)?;
        for product_id in &skipped {
            warn!(
                invoice_number = %bill.invoice_number,
                product_id = %product_id,
                "Product no longer exists; stock not restored"
            );
        }

        tx.save_list(keys::PRODUCTS, &products).await?;
        tx.save_list(keys::BILLS, &bills).await?;
        tx.commit().await?;

        info!(id = %id, invoice_number = %bill.invoice_number, "Bill deleted, stock restored");
        Ok(true)
    }

    /// All bills in creation order.
    pub async fn list_bills(&self) -> DbResult<Vec<Bill>> {
        self.store.load_list(keys::BILLS).await
    }

    pub async fn get_bill(&self, id: &str) -> DbResult<Option<Bill>> {
        Ok(self.list_bills().await?.into_iter().find(|b| b.id == id))
    }

    /// Bills of one customer, in creation order.
    pub async fn get_bills_by_customer(&self, customer_id: &str) -> DbResult<Vec<Bill>> {
        let bills = self.list_bills().await?;
        Ok(bills
            .into_iter()
            .filter(|b| b.customer_id == customer_id)
            .collect())
    }

    /// Corrects the customer of a committed bill. Items, totals and stock
    /// are never touched.
    ///
    /// When only `customer_id` is given, the name is taken from the
    /// directory.
    ///
    /// ## Returns
    /// `Ok(None)` for an unknown bill ID.
    pub async fn update_bill(&self, id: &str, mut update: BillUpdate) -> DbResult<Option<Bill>> {
        let mut tx = self.store.begin().await?;

        if update.customer_name.is_none() {
            if let Some(customer_id) = update.customer_id.clone() {
                let customers: Vec<Customer> = tx.load_list(keys::CUSTOMERS).await?;
                let customer = customers
                    .into_iter()
                    .find(|c| c.id == customer_id)
                    .ok_or(CoreError::CustomerNotFound(customer_id))?;
                update.customer_name = Some(customer.name);
            }
        }

        let mut bills: Vec<Bill> = tx.load_list(keys::BILLS).await?;
        let Some(bill) = bills.iter_mut().find(|b| b.id == id) else {
            debug!(id = %id, "Update of unknown bill ignored");
            return Ok(None);
        };
        bill.apply_update(update);
        let updated = bill.clone();

        tx.save_list(keys::BILLS, &bills).await?;
        tx.commit().await?;

        info!(id = %id, customer_id = %updated.customer_id, "Bill customer corrected");
        Ok(Some(updated))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use billbook_core::{BillLine, CustomerDraft, Money, Percent, ProductDraft};

    struct Fixture {
        db: Database,
        a: Product,
        b: Product,
        customer: Customer,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products();
        let cat = products
            .add(ProductDraft {
                name: "General".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let a = products
            .add(ProductDraft {
                name: "A".into(),
                parent_id: Some(cat.id.clone()),
                price: Money::from_cents(10000),
                stock: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        let b = products
            .add(ProductDraft {
                name: "B".into(),
                parent_id: Some(cat.id.clone()),
                price: Money::from_cents(5000),
                stock: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        let customer = db
            .customers()
            .add(CustomerDraft {
                name: "Asha".into(),
                phone: "98765".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        Fixture { db, a, b, customer }
    }

    fn line(product: &Product, quantity: i64) -> BillLine {
        BillLine {
            product_id: product.id.clone(),
            quantity,
            price: None,
        }
    }

    fn draft(customer: &Customer, lines: Vec<BillLine>) -> BillDraft {
        BillDraft {
            customer_id: customer.id.clone(),
            lines,
            discount_percent: Percent::from_bps(1000),
            tax_percent: Percent::from_bps(1800),
        }
    }

    async fn stock_of(db: &Database, product: &Product) -> i64 {
        db.products().get_by_id(&product.id).await.unwrap().unwrap().stock()
    }

    #[tokio::test]
    async fn test_create_bill_scenario() {
        // A: 3 x 100.00, B: 1 x 50.00, 10% discount, 18% tax
        let f = fixture().await;
        let bill = f
            .db
            .billing()
            .create_bill(draft(&f.customer, vec![line(&f.a, 3), line(&f.b, 1)]))
            .await
            .unwrap();

        assert_eq!(bill.invoice_number, "INV-1001");
        assert_eq!(bill.customer_name, "Asha");
        assert_eq!(bill.subtotal.cents(), 35000);
        assert_eq!(bill.discount_amount.cents(), 3500);
        assert_eq!(bill.tax_amount.cents(), 5670);
        assert_eq!(bill.total.cents(), 37170);
        assert_eq!(bill.total, (bill.subtotal - bill.discount_amount) + bill.tax_amount);

        assert_eq!(stock_of(&f.db, &f.a).await, 7);
        assert_eq!(stock_of(&f.db, &f.b).await, 0);
        assert_eq!(f.db.billing().list_bills().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_bill_is_all_or_nothing() {
        let f = fixture().await;
        let engine = f.db.billing();

        let err = engine
            .create_bill(draft(&f.customer, vec![line(&f.a, 3), line(&f.b, 2)]))
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        assert_eq!(stock_of(&f.db, &f.a).await, 10);
        assert_eq!(stock_of(&f.db, &f.b).await, 1);
        assert!(engine.list_bills().await.unwrap().is_empty());
        assert_eq!(
            f.db.invoices().peek_next_invoice_number().await.unwrap().to_string(),
            "INV-1001"
        );
    }

    #[tokio::test]
    async fn test_negative_line_price_rolls_back() {
        let f = fixture().await;
        let mut priced = line(&f.a, 1);
        priced.price = Some(Money::from_cents(-100000));

        let err = f
            .db
            .billing()
            .create_bill(draft(&f.customer, vec![priced]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        assert_eq!(stock_of(&f.db, &f.a).await, 10);
        assert!(f.db.billing().list_bills().await.unwrap().is_empty());
        assert_eq!(
            f.db.invoices().peek_next_invoice_number().await.unwrap().to_string(),
            "INV-1001"
        );
    }

    #[tokio::test]
    async fn test_unknown_customer_rolls_back() {
        let f = fixture().await;
        let mut d = draft(&f.customer, vec![line(&f.a, 1)]);
        d.customer_id = "ghost".into();

        let err = f.db.billing().create_bill(d).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CustomerNotFound(_))));
        assert_eq!(stock_of(&f.db, &f.a).await, 10);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let f = fixture().await;
        let engine = f.db.billing();
        let bill = engine
            .create_bill(draft(&f.customer, vec![line(&f.a, 4)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&f.db, &f.a).await, 6);

        assert!(engine.delete_bill(&bill.id).await.unwrap());
        assert_eq!(stock_of(&f.db, &f.a).await, 10);
        assert!(engine.get_bill(&bill.id).await.unwrap().is_none());
        assert!(!engine.delete_bill(&bill.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_skips_vanished_products() {
        let f = fixture().await;
        let engine = f.db.billing();
        let bill = engine
            .create_bill(draft(&f.customer, vec![line(&f.a, 1), line(&f.b, 1)]))
            .await
            .unwrap();

        f.db.products().delete(&f.b.id).await.unwrap();
        assert!(engine.delete_bill(&bill.id).await.unwrap());
        assert_eq!(stock_of(&f.db, &f.a).await, 10);
    }

    #[tokio::test]
    async fn test_invoice_numbers_survive_deletion() {
        let f = fixture().await;
        let engine = f.db.billing();

        let first = engine
            .create_bill(draft(&f.customer, vec![line(&f.a, 1)]))
            .await
            .unwrap();
        engine.delete_bill(&first.id).await.unwrap();
        let second = engine
            .create_bill(draft(&f.customer, vec![line(&f.a, 1)]))
            .await
            .unwrap();

        assert_eq!(first.invoice_number, "INV-1001");
        assert_eq!(second.invoice_number, "INV-1002");
    }

    #[tokio::test]
    async fn test_peek_matches_committed_number() {
        let f = fixture().await;
        let peeked = f.db.invoices().peek_next_invoice_number().await.unwrap();
        let bill = f
            .db
            .billing()
            .create_bill(draft(&f.customer, vec![line(&f.a, 1)]))
            .await
            .unwrap();
        assert_eq!(bill.invoice_number, peeked.to_string());
    }

    #[tokio::test]
    async fn test_bills_by_customer_and_update() {
        let f = fixture().await;
        let engine = f.db.billing();
        let ravi = f
            .db
            .customers()
            .add(CustomerDraft {
                name: "Ravi".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let b1 = engine.create_bill(draft(&f.customer, vec![line(&f.a, 1)])).await.unwrap();
        let b2 = engine.create_bill(draft(&ravi, vec![line(&f.a, 1)])).await.unwrap();
        let b3 = engine.create_bill(draft(&f.customer, vec![line(&f.a, 1)])).await.unwrap();

        let ashas: Vec<String> = engine
            .get_bills_by_customer(&f.customer.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ashas, vec![b1.id.clone(), b3.id.clone()]);

        let moved = engine
            .update_bill(
                &b2.id,
                BillUpdate {
                    customer_id: Some(f.customer.id.clone()),
                    customer_name: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.customer_name, "Asha");
        assert_eq!(moved.total, b2.total);
        assert_eq!(stock_of(&f.db, &f.a).await, 7);

        assert!(engine
            .update_bill("ghost", BillUpdate::default())
            .await
            .unwrap()
            .is_none());
    }
}
