//! # Database Handle
//!
//! Opens the store file, applies migrations and hands out the components
//! that work on it.
//!
//! ```text
//!   DbConfig ──► Database::new ──► SqlitePool (WAL) ──► migrations
//!                     │
//!                     ├── store()        raw KvStore
//!                     ├── products()     catalog
//!                     ├── customers()    directory
//!                     ├── invoices()     counter
//!                     ├── billing()      create/delete/update bills
//!                     └── interchange()  sheet import/export
//! ```
//!
//! Every component owns a clone of the pool, so handing them out is cheap
//! and they can move into spawned tasks.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::billing::BillingEngine;
use crate::error::{DbError, DbResult};
use crate::interchange::InterchangeService;
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::invoice::InvoiceSequencer;
use crate::repository::product::ProductRepository;
use crate::store::KvStore;

/// Where the store lives and how the pool treats it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Store file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,

    /// Pool size. The desk app needs two: the command worker and autosave.
    pub max_connections: u32,

    /// How long a writer waits on SQLite's lock before giving up.
    pub busy_timeout: Duration,

    /// Apply pending migrations while opening.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Store file at `path`, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: Some(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Fresh database that disappears with the handle. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            path: None,
            // A second connection would see an empty database
            max_connections: 1,
            busy_timeout: Duration::from_secs(1),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.path {
            Some(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            None => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };
        Ok(options.busy_timeout(self.busy_timeout))
    }
}

/// Open store. Clone freely.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        match &config.path {
            Some(path) => info!(path = %path.display(), "Opening store"),
            None => info!("Opening in-memory store"),
        }

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.path.is_none() {
            // Closing the only connection would drop the data with it
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        if config.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Raw key-value access.
    pub fn store(&self) -> KvStore {
        KvStore::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.store())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.store())
    }

    pub fn invoices(&self) -> InvoiceSequencer {
        InvoiceSequencer::new(self.store())
    }

    pub fn billing(&self) -> BillingEngine {
        BillingEngine::new(self.store())
    }

    pub fn interchange(&self) -> InterchangeService {
        InterchangeService::new(self.store())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        info!("Closing store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
