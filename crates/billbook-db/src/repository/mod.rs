//! # Repository Module
//!
//! Collection-level access to the key-value store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Desk command                                                          │
//! │       │  db.products().adjust_stock(id, -5)                            │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── begin transaction                                                 │
//! │  ├── load "products" list                                              │
//! │  ├── change one record in memory (rules from billbook-core)            │
//! │  ├── save "products" list                                              │
//! │  └── commit                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kv_store table                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, stock, hierarchy
//! - [`CustomerRepository`](customer::CustomerRepository) - Directory CRUD and search
//! - [`InvoiceSequencer`](invoice::InvoiceSequencer) - Invoice counter

pub mod customer;
pub mod invoice;
pub mod product;

use uuid::Uuid;

/// Generates a new record ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
