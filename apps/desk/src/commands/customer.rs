//! # Customer Commands

use billbook_core::{Customer, CustomerDraft, CustomerUpdate};
use tracing::info;

use crate::error::ApiError;
use crate::state::DbState;

pub async fn list_customers(db: &DbState) -> Result<Vec<Customer>, ApiError> {
    Ok(db.inner().customers().list().await?)
}

pub async fn add_customer(db: &DbState, draft: CustomerDraft) -> Result<Customer, ApiError> {
    let customer = db.inner().customers().add(draft).await?;
    info!(id = %customer.id, "Customer added");
    Ok(customer)
}

pub async fn update_customer(
    db: &DbState,
    id: &str,
    update: CustomerUpdate,
) -> Result<Option<Customer>, ApiError> {
    Ok(db.inner().customers().update(id, update).await?)
}

/// Bills keep their customer name snapshot after the customer is deleted.
pub async fn delete_customer(db: &DbState, id: &str) -> Result<bool, ApiError> {
    Ok(db.inner().customers().delete(id).await?)
}

pub async fn search_customers(db: &DbState, query: &str) -> Result<Vec<Customer>, ApiError> {
    Ok(db.inner().customers().search(query).await?)
}

/// Exact phone lookup for the counter. `None` when nobody has that number.
pub async fn find_customer_by_phone(
    db: &DbState,
    phone: &str,
) -> Result<Option<Customer>, ApiError> {
    Ok(db.inner().customers().find_by_phone(phone).await?)
}
