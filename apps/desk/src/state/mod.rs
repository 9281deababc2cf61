//! # State Module
//!
//! Application state owned by the command bus worker.
//!
//! ## Why Multiple State Types?
//! Each command function takes only the state it touches, so a product
//! command never sees the cart and a cart command never sees the config.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Command bus worker                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │  CartState   │  │   ConfigState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │  Database    │  │  Arc<Mutex<  │  │  store_name      │              │
//! │  │  (SQLite     │  │    Cart      │  │  currency        │              │
//! │  │   pool)      │  │  >>          │  │  default rates   │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                            │                                            │
//! │                            └──── shared with the draft autosave task   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState: Protected by Arc<Mutex<T>> for exclusive access          │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;

pub use cart::{Cart, CartItem, CartState, CartTotals};
pub use config::ConfigState;
pub use db::DbState;
