//! # Key-Value Store Adapter
//!
//! Every collection is one row of the `kv_store` table: a key and a JSON
//! blob. Repositories read a whole list, change it in memory, and write the
//! whole list back.
//!
//! ## Transactions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  store.begin() ──► StoreTransaction                                    │
//! │                      │                                                  │
//! │                      ├── load_list("products")                         │
//! │                      ├── load_value("invoiceCounter")                  │
//! │                      ├── save_list("products", ..)     staged          │
//! │                      ├── save_value("invoiceCounter")  staged          │
//! │                      ├── save_list("bills", ..)        staged          │
//! │                      │                                                  │
//! │                      ├── commit() ──► all three visible                │
//! │                      └── drop     ──► none of them happened            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! While a transaction is open, read through it rather than through the
//! store: an in-memory database has a single connection.
//!
//! Transactions start with `BEGIN IMMEDIATE`, taking the write lock before
//! the first read. Other writers (the draft autosave) wait on the busy
//! timeout instead of invalidating the snapshot the transaction read from.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Storage keys of the persisted collections.
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const CUSTOMERS: &str = "customers";
    pub const BILLS: &str = "bills";
    pub const INVOICE_COUNTER: &str = "invoiceCounter";
    pub const BILL_DRAFT: &str = "billDraft";
}

// =============================================================================
// Shared Queries
// =============================================================================

async fn fetch_value<'e, E, T>(executor: E, key: &str) -> DbResult<Option<T>>
where
    E: Executor<'e, Database = Sqlite>,
    T: DeserializeOwned,
{
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key.to_string())
        .fetch_optional(executor)
        .await?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

async fn upsert_value<'e, E, T>(executor: E, key: &str, value: &T) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    debug!(key = %key, bytes = raw.len(), "Writing store value");

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key.to_string())
    .bind(raw)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(())
}

async fn delete_value<'e, E>(executor: E, key: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
        .bind(key.to_string())
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// KvStore
// =============================================================================

/// Typed access to the key-value table.
///
/// ## Usage
/// ```rust,ignore
/// let store = db.store();
/// let products: Vec<Product> = store.load_list(keys::PRODUCTS).await?;
/// store.save_list(keys::PRODUCTS, &products).await?;
/// ```
#[derive(Debug, Clone)]
pub struct KvStore {
    pool: SqlitePool,
}

impl KvStore {
    pub fn new(pool: SqlitePool) -> Self {
        KvStore { pool }
    }

    /// Loads a list; an absent key is an empty list.
    pub async fn load_list<T: DeserializeOwned>(&self, key: &str) -> DbResult<Vec<T>> {
        Ok(fetch_value(&self.pool, key).await?.unwrap_or_default())
    }

    /// Replaces a list wholesale.
    pub async fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> DbResult<()> {
        upsert_value(&self.pool, key, items).await
    }

    pub async fn load_value<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        fetch_value(&self.pool, key).await
    }

    pub async fn save_value<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        upsert_value(&self.pool, key, value).await
    }

    /// Deletes a key. Returns whether anything was there.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        delete_value(&self.pool, key).await
    }

    /// Opens a write transaction. Dropping it without
    /// [`StoreTransaction::commit`] rolls every staged write back.
    pub async fn begin(&self) -> DbResult<StoreTransaction> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(StoreTransaction { tx })
    }
}

// =============================================================================
// StoreTransaction
// =============================================================================

/// A unit of work over several keys.
pub struct StoreTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTransaction {
    pub async fn load_list<T: DeserializeOwned>(&mut self, key: &str) -> DbResult<Vec<T>> {
        Ok(fetch_value(&mut *self.tx, key).await?.unwrap_or_default())
    }

    pub async fn save_list<T: Serialize>(&mut self, key: &str, items: &[T]) -> DbResult<()> {
        upsert_value(&mut *self.tx, key, items).await
    }

    pub async fn load_value<T: DeserializeOwned>(&mut self, key: &str) -> DbResult<Option<T>> {
        fetch_value(&mut *self.tx, key).await
    }

    pub async fn save_value<T: Serialize>(&mut self, key: &str, value: &T) -> DbResult<()> {
        upsert_value(&mut *self.tx, key, value).await
    }

    pub async fn remove(&mut self, key: &str) -> DbResult<bool> {
        delete_value(&mut *self.tx, key).await
    }

    /// Makes every staged write visible at once.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn store() -> KvStore {
        Database::new(DbConfig::in_memory()).await.unwrap().store()
    }

    #[tokio::test]
    async fn test_absent_key_is_empty_list() {
        let store = store().await;
        let list: Vec<String> = store.load_list(keys::PRODUCTS).await.unwrap();
        assert!(list.is_empty());
        assert_eq!(store.load_value::<u64>(keys::INVOICE_COUNTER).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = store().await;
        store
            .save_list(keys::CUSTOMERS, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        store.save_value(keys::INVOICE_COUNTER, &1004u64).await.unwrap();
        store.save_value(keys::INVOICE_COUNTER, &1005u64).await.unwrap();

        let list: Vec<String> = store.load_list(keys::CUSTOMERS).await.unwrap();
        assert_eq!(list, vec!["a", "b"]);
        assert_eq!(store.load_value::<u64>(keys::INVOICE_COUNTER).await.unwrap(), Some(1005));

        assert!(store.remove(keys::CUSTOMERS).await.unwrap());
        assert!(!store.remove(keys::CUSTOMERS).await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = store().await;
        store.save_value(keys::INVOICE_COUNTER, &1000u64).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.save_value(keys::INVOICE_COUNTER, &1001u64).await.unwrap();
            tx.save_list(keys::BILLS, &["x".to_string()]).await.unwrap();
            assert_eq!(tx.load_value::<u64>(keys::INVOICE_COUNTER).await.unwrap(), Some(1001));
        }

        assert_eq!(store.load_value::<u64>(keys::INVOICE_COUNTER).await.unwrap(), Some(1000));
        assert!(store.load_list::<String>(keys::BILLS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        tx.save_value(keys::INVOICE_COUNTER, &1001u64).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.load_value::<u64>(keys::INVOICE_COUNTER).await.unwrap(), Some(1001));
    }

    #[tokio::test]
    async fn test_concurrent_write_waits_for_transaction() {
        let path = std::env::temp_dir().join(format!("billbook-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(2)).await.unwrap();
        let store = db.store();

        let mut tx = store.begin().await.unwrap();
        let mut products: Vec<String> = tx.load_list(keys::PRODUCTS).await.unwrap();

        // Autosave writing from the other connection mid-transaction
        let autosave = {
            let store = store.clone();
            tokio::spawn(async move { store.save_value(keys::BILL_DRAFT, &"draft").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        products.push("rice".to_string());
        tx.save_list(keys::PRODUCTS, &products).await.unwrap();
        tx.commit().await.unwrap();
        autosave.await.unwrap().unwrap();

        assert_eq!(store.load_list::<String>(keys::PRODUCTS).await.unwrap(), vec!["rice"]);
        assert_eq!(
            store.load_value::<String>(keys::BILL_DRAFT).await.unwrap().as_deref(),
            Some("draft")
        );

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_a_serialization_error() {
        let store = store().await;
        store.save_value(keys::PRODUCTS, &"not a list").await.unwrap();
        let err = store.load_list::<u64>(keys::PRODUCTS).await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }
}
