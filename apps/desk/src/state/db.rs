//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn low_stock(db: &DbState) -> Result<Vec<Product>, ApiError> {
//!     Ok(db.inner().products().low_stock().await?)
//! }
//! ```

use billbook_db::Database;

/// Wrapper around `Database` for the command worker.
///
/// Cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
