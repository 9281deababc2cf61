//! # billbook-db: Storage Layer for Billbook
//!
//! Persistence for the catalog, the customer directory and the bill ledger,
//! plus the billing transaction engine that ties them together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Desk command (createBill)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   billbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ Repositories  │    │ BillingEngine│  │   │
//! │  │   │   (pool.rs)   │    │ Product       │    │ Interchange  │  │   │
//! │  │   │               │◄───│ Customer      │◄───│ Service      │  │   │
//! │  │   │   KvStore     │    │ Invoice       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: kv_store(key, value JSON, updated_at)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billbook_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("billbook.db")).await?;
//! let bill = db.billing().create_bill(draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod interchange;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use billing::BillingEngine;
pub use error::{DbError, DbResult};
pub use interchange::InterchangeService;
pub use pool::{Database, DbConfig};
pub use store::{keys, KvStore, StoreTransaction};

pub use repository::customer::CustomerRepository;
pub use repository::invoice::InvoiceSequencer;
pub use repository::product::ProductRepository;
