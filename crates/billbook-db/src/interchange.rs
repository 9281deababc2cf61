//! # Interchange Service
//!
//! Persists sheet imports and produces sheet exports. The row mapping itself
//! lives in `billbook_core::interchange`; this module only loads, merges
//! and saves inside one store transaction.
//!
//! ```text
//! bytes ──► parse_sheet ──► (malformed? stop, nothing opened)
//!                │
//!                ▼
//!   BEGIN ─ load list ─ import_* ─ save merged list ─ COMMIT
//! ```

use chrono::Utc;
use tracing::{info, warn};

use billbook_core::interchange::{
    bills_to_sheet, customers_to_sheet, import_customers, import_products, parse_sheet,
    products_to_sheet, ImportReport, Sheet,
};
use billbook_core::{Bill, Customer, Product};

use crate::error::DbResult;
use crate::repository::generate_id;
use crate::store::{keys, KvStore};

#[derive(Debug, Clone)]
pub struct InterchangeService {
    store: KvStore,
}

impl InterchangeService {
    pub fn new(store: KvStore) -> Self {
        InterchangeService { store }
    }

    pub async fn export_products(&self) -> DbResult<Sheet> {
        let products: Vec<Product> = self.store.load_list(keys::PRODUCTS).await?;
        Ok(products_to_sheet(&products))
    }

    pub async fn export_customers(&self) -> DbResult<Sheet> {
        let customers: Vec<Customer> = self.store.load_list(keys::CUSTOMERS).await?;
        Ok(customers_to_sheet(&customers))
    }

    /// Ledger layout; there is no matching import.
    pub async fn export_bills(&self) -> DbResult<Sheet> {
        let bills: Vec<Bill> = self.store.load_list(keys::BILLS).await?;
        Ok(bills_to_sheet(&bills))
    }

    /// Imports a product sheet.
    ///
    /// ## Errors
    /// `MalformedInterchangeFile` for unreadable bytes; the catalog is left
    /// untouched. Problems with single rows are reported, not raised.
    pub async fn import_products(&self, bytes: &[u8]) -> DbResult<ImportReport> {
        let sheet = parse_sheet(bytes)?;

        let mut tx = self.store.begin().await?;
        let existing: Vec<Product> = tx.load_list(keys::PRODUCTS).await?;
        let outcome = import_products(&existing, &sheet, Utc::now(), generate_id);
        tx.save_list(keys::PRODUCTS, &outcome.records).await?;
        tx.commit().await?;

        log_report("products", &outcome.report);
        Ok(outcome.report)
    }

    /// Imports a customer sheet. Same contract as [`Self::import_products`].
    pub async fn import_customers(&self, bytes: &[u8]) -> DbResult<ImportReport> {
        let sheet = parse_sheet(bytes)?;

        let mut tx = self.store.begin().await?;
        let existing: Vec<Customer> = tx.load_list(keys::CUSTOMERS).await?;
        let outcome = import_customers(&existing, &sheet, Utc::now(), generate_id);
        tx.save_list(keys::CUSTOMERS, &outcome.records).await?;
        tx.commit().await?;

        log_report("customers", &outcome.report);
        Ok(outcome.report)
    }
}

fn log_report(collection: &str, report: &ImportReport) {
    for w in &report.warnings {
        warn!(collection, row = w.row, "{}", w.message);
    }
    info!(
        collection,
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        "Import finished"
    );
}
