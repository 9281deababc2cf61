//! # Invoice Sequencer
//!
//! Owns the persisted `invoiceCounter`.
//!
//! ```text
//! counter absent ──► 1000 (seed)
//!
//! peek_next_invoice_number()  reads 1000 ──► INV-1001   (nothing written)
//! next_invoice_number()       reads 1000 ──► writes 1001 ──► INV-1001
//! next_invoice_number()       reads 1001 ──► writes 1002 ──► INV-1002
//! ```
//!
//! The counter only grows. Deleting a bill never gives its number back.

use billbook_core::{InvoiceNumber, INVOICE_COUNTER_SEED};
use tracing::debug;

use crate::error::DbResult;
use crate::store::{keys, KvStore, StoreTransaction};

#[derive(Debug, Clone)]
pub struct InvoiceSequencer {
    store: KvStore,
}

impl InvoiceSequencer {
    pub fn new(store: KvStore) -> Self {
        InvoiceSequencer { store }
    }

    /// The number the next committed bill would receive. Consumes nothing.
    pub async fn peek_next_invoice_number(&self) -> DbResult<InvoiceNumber> {
        let counter: u64 = self
            .store
            .load_value(keys::INVOICE_COUNTER)
            .await?
            .unwrap_or(INVOICE_COUNTER_SEED);
        Ok(InvoiceNumber::new(counter).next())
    }

    /// Consumes and returns the next number.
    pub async fn next_invoice_number(&self) -> DbResult<InvoiceNumber> {
        let mut tx = self.store.begin().await?;
        let number = Self::allocate(&mut tx).await?;
        tx.commit().await?;
        Ok(number)
    }

    /// Increments the counter inside a caller's transaction.
    pub(crate) async fn allocate(tx: &mut StoreTransaction) -> DbResult<InvoiceNumber> {
        let counter: u64 = tx
            .load_value(keys::INVOICE_COUNTER)
            .await?
            .unwrap_or(INVOICE_COUNTER_SEED);
        let number = InvoiceNumber::new(counter).next();
        tx.save_value(keys::INVOICE_COUNTER, &number.value()).await?;

        debug!(invoice_number = %number, "Invoice number allocated");
        Ok(number)
    }
}
