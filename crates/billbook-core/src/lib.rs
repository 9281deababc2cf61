//! # billbook-core: Pure Business Logic for Billbook
//!
//! This crate is the **heart** of Billbook. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billbook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Desk app (command bus)                       │   │
//! │  │    add_product, create_bill, import_products, etc.              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ billbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  billing  │  │interchange│  │   │
//! │  │   │  Product  │  │   Money   │  │  staging  │  │  sheets   │  │   │
//! │  │   │   Bill    │  │  Percent  │  │  totals   │  │  import   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                billbook-db (Persistence Layer)                  │   │
//! │  │        key-value store, repositories, billing engine            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Bill, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`billing`] - Stock staging and bill totals
//! - [`interchange`] - Tabular (sheet) export and import reconciliation
//!
//! ## Example Usage
//!
//! ```rust
//! use billbook_core::money::Money;
//! use billbook_core::types::Percent;
//!
//! let subtotal = Money::from_cents(35000); // 350.00
//! let discount = subtotal.percentage(Percent::from_bps(1000)); // 10%
//! assert_eq!(discount, Some(Money::from_cents(3500)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod interchange;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Invoice counter value assumed when none has been persisted yet.
///
/// The counter is incremented before use, so the first invoice issued
/// is `INV-1001`.
pub const INVOICE_COUNTER_SEED: u64 = 1000;

/// Prefix of every human-facing invoice number.
pub const INVOICE_PREFIX: &str = "INV-";

/// Label written into the "Parent Category" column for products
/// that have no parent.
pub const TOP_LEVEL_LABEL: &str = "Top Level";

/// Maximum number of distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;
