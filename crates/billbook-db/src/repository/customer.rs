//! # Customer Repository
//!
//! Directory operations over the `customers` list. Phone is the natural key
//! used to recognise a customer across imports.

use chrono::Utc;
use tracing::{debug, info};

use billbook_core::validation::{
    validate_customer_draft, validate_name, validate_phone, validate_search_query,
};
use billbook_core::{Customer, CustomerDraft, CustomerUpdate};

use crate::error::DbResult;
use crate::repository::generate_id;
use crate::store::{keys, KvStore};

/// Repository for the customer directory.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    store: KvStore,
}

impl CustomerRepository {
    pub fn new(store: KvStore) -> Self {
        CustomerRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        self.store.load_list(keys::CUSTOMERS).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        Ok(self.list().await?.into_iter().find(|c| c.id == id))
    }

    /// Adds a customer with a fresh ID and creation time.
    pub async fn add(&self, draft: CustomerDraft) -> DbResult<Customer> {
        validate_customer_draft(&draft)?;

        let mut tx = self.store.begin().await?;
        let mut customers: Vec<Customer> = tx.load_list(keys::CUSTOMERS).await?;

        let customer = Customer::from_draft(generate_id(), draft, Utc::now());
        customers.push(customer.clone());

        tx.save_list(keys::CUSTOMERS, &customers).await?;
        tx.commit().await?;

        info!(id = %customer.id, "Customer added");
        Ok(customer)
    }

    /// Merges the present fields. `Ok(None)` for an unknown ID.
    pub async fn update(&self, id: &str, update: CustomerUpdate) -> DbResult<Option<Customer>> {
        let mut tx = self.store.begin().await?;
        let mut customers: Vec<Customer> = tx.load_list(keys::CUSTOMERS).await?;

        let Some(customer) = customers.iter_mut().find(|c| c.id == id) else {
            debug!(id = %id, "Update of unknown customer ignored");
            return Ok(None);
        };

        if let Some(name) = update.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(phone) = update.phone.as_deref() {
            validate_phone(phone)?;
        }
        customer.apply_update(update);
        let updated = customer.clone();

        tx.save_list(keys::CUSTOMERS, &customers).await?;
        tx.commit().await?;

        Ok(Some(updated))
    }

    /// Removes a customer. Their bills keep the frozen name.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let mut tx = self.store.begin().await?;
        let mut customers: Vec<Customer> = tx.load_list(keys::CUSTOMERS).await?;

        let before = customers.len();
        customers.retain(|c| c.id != id);
        if customers.len() == before {
            return Ok(false);
        }

        tx.save_list(keys::CUSTOMERS, &customers).await?;
        tx.commit().await?;

        info!(id = %id, "Customer deleted");
        Ok(true)
    }

    /// Name (case-insensitive) or phone substring match.
    ///
    /// A blank query returns the full list.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query)?;
        let customers = self.list().await?;
        if query.is_empty() {
            return Ok(customers);
        }
        Ok(customers.into_iter().filter(|c| c.matches(&query)).collect())
    }

    /// Exact phone lookup after trimming. A blank phone matches nobody.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Ok(None);
        }
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|c| c.phone.trim().eq_ignore_ascii_case(phone)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn repo() -> CustomerRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().customers()
    }

    fn draft(name: &str, phone: &str) -> CustomerDraft {
        CustomerDraft {
            name: name.into(),
            phone: phone.into(),
            address: String::new(),
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let repo = repo().await;
        let asha = repo.add(draft("Asha Verma", "98765 43210")).await.unwrap();

        let updated = repo
            .update(
                &asha.id,
                CustomerUpdate {
                    address: Some("12 Market Road".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.address, "12 Market Road");
        assert_eq!(updated.name, "Asha Verma");

        assert!(repo.update("ghost", CustomerUpdate::default()).await.unwrap().is_none());
        assert!(repo.delete(&asha.id).await.unwrap());
        assert!(!repo.delete(&asha.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_unknown_customer_skips_validation() {
        let repo = repo().await;

        let blank_name = CustomerUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(repo.update("ghost", blank_name).await.unwrap().is_none());

        let bad_phone = CustomerUpdate {
            phone: Some("call me".into()),
            ..Default::default()
        };
        assert!(repo.update("ghost", bad_phone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_blank_name() {
        let repo = repo().await;
        assert!(repo.add(draft("  ", "123")).await.is_err());
    }

    #[tokio::test]
    async fn test_search() {
        let repo = repo().await;
        repo.add(draft("Asha Verma", "98765 43210")).await.unwrap();
        repo.add(draft("Ravi Kumar", "91234 00000")).await.unwrap();

        assert_eq!(repo.search("asha").await.unwrap().len(), 1);
        assert_eq!(repo.search("00000").await.unwrap()[0].name, "Ravi Kumar");
        assert_eq!(repo.search("9").await.unwrap().len(), 2);
        assert_eq!(repo.search("").await.unwrap().len(), 2);
        assert!(repo.search("zed").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_phone() {
        let repo = repo().await;
        let asha = repo.add(draft("Asha", "98765")).await.unwrap();
        repo.add(draft("Walk-in", "")).await.unwrap();

        assert_eq!(repo.find_by_phone(" 98765 ").await.unwrap().unwrap().id, asha.id);
        assert!(repo.find_by_phone("").await.unwrap().is_none());
    }
}
