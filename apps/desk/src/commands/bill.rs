//! # Bill Commands
//!
//! Direct access to the billing engine. The counter flow normally goes
//! through the cart (`checkoutCart` in `cart.rs`); `createBill` takes a
//! complete draft from the caller instead.

use billbook_core::{Bill, BillDraft, BillUpdate};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::DbState;

/// An invoice number as shown and as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceNumberResponse {
    /// e.g. "INV-1001"
    pub invoice_number: String,
    pub value: u64,
}

impl From<billbook_core::InvoiceNumber> for InvoiceNumberResponse {
    fn from(number: billbook_core::InvoiceNumber) -> Self {
        InvoiceNumberResponse {
            invoice_number: number.to_string(),
            value: number.value(),
        }
    }
}

pub async fn create_bill(db: &DbState, draft: BillDraft) -> Result<Bill, ApiError> {
    Ok(db.inner().billing().create_bill(draft).await?)
}

/// Deletes a bill and restores its stock. Unknown IDs return `false`.
pub async fn delete_bill(db: &DbState, id: &str) -> Result<bool, ApiError> {
    Ok(db.inner().billing().delete_bill(id).await?)
}

pub async fn list_bills(db: &DbState) -> Result<Vec<Bill>, ApiError> {
    Ok(db.inner().billing().list_bills().await?)
}

pub async fn get_bill(db: &DbState, id: &str) -> Result<Bill, ApiError> {
    db.inner()
        .billing()
        .get_bill(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bill", id))
}

pub async fn get_bills_by_customer(
    db: &DbState,
    customer_id: &str,
) -> Result<Vec<Bill>, ApiError> {
    debug!(customer_id = %customer_id, "get_bills_by_customer command");
    Ok(db.inner().billing().get_bills_by_customer(customer_id).await?)
}

pub async fn update_bill(
    db: &DbState,
    id: &str,
    update: BillUpdate,
) -> Result<Option<Bill>, ApiError> {
    Ok(db.inner().billing().update_bill(id, update).await?)
}

/// Consumes a number. Bills get theirs on commit, so this is only for
/// callers numbering something outside the engine.
pub async fn next_invoice_number(db: &DbState) -> Result<InvoiceNumberResponse, ApiError> {
    Ok(db.inner().invoices().next_invoice_number().await?.into())
}

/// The number the next committed bill would receive.
pub async fn peek_invoice_number(db: &DbState) -> Result<InvoiceNumberResponse, ApiError> {
    Ok(db.inner().invoices().peek_next_invoice_number().await?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use billbook_core::{BillLine, CustomerDraft, Money, ProductDraft};
    use billbook_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_delete_bill() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let product = db
            .inner()
            .products()
            .add(ProductDraft {
                name: "Tea 250g".into(),
                price: Money::from_cents(14500),
                stock: 6,
                ..Default::default()
            })
            .await
            .unwrap();
        let customer = db
            .inner()
            .customers()
            .add(CustomerDraft {
                name: "Meera".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(peek_invoice_number(&db).await.unwrap().invoice_number, "INV-1001");

        let bill = create_bill(
            &db,
            BillDraft {
                customer_id: customer.id.clone(),
                lines: vec![BillLine {
                    product_id: product.id.clone(),
                    quantity: 4,
                    price: None,
                }],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(bill.invoice_number, "INV-1001");
        assert_eq!(bill.total.cents(), 58000);
        assert_eq!(get_bills_by_customer(&db, &customer.id).await.unwrap().len(), 1);

        assert!(delete_bill(&db, &bill.id).await.unwrap());
        let restored = db.inner().products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(restored.stock(), 6);

        let err = get_bill(&db, &bill.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(peek_invoice_number(&db).await.unwrap().value, 1002);
    }

    #[tokio::test]
    async fn test_empty_draft_is_rejected() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let err = create_bill(&db, BillDraft::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
