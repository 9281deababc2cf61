//! # Billbook Desk Library
//!
//! Counter application: wires configuration, storage, the cart and the
//! command bus together and serves commands over stdio.
//!
//! ## Module Organization
//! ```text
//! billbook_desk/
//! ├── lib.rs          ◄─── You are here (startup & shutdown)
//! ├── config.rs       ◄─── DeskConfig: TOML + BILLBOOK_* overrides
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Cart state management
//! │   └── config.rs   ◄─── Runtime configuration view
//! ├── commands/       ◄─── Command enum, bus worker, one file per area
//! ├── draft.rs        ◄─── Cart draft persistence + autosave task
//! ├── frontend.rs     ◄─── JSON-lines request/reply loop
//! └── error.rs        ◄─── ApiError for commands, DeskError for startup
//! ```

pub mod commands;
pub mod config;
pub mod draft;
pub mod error;
pub mod frontend;
pub mod state;

use std::path::PathBuf;

use billbook_db::{Database, DbConfig};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{CommandBus, WorkerState};
use config::DeskConfig;
use draft::{restore_draft, DraftAutosave};
use error::DeskResult;
use state::{Cart, CartState, ConfigState, DbState};

/// Runs the application until stdin closes or Ctrl-C.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults → billbook.toml → BILLBOOK_* env → validate              │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber to stderr, RUST_LOG overrides config filter    │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │                                                                         │
/// │  4. Initialize State Objects ─────────────────────────────────────────► │
/// │     • CartState: saved draft, or empty with default percentages         │
/// │     • Draft autosave task started                                       │
/// │     • Command bus worker spawned                                        │
/// │                                                                         │
/// │  5. Serve stdin until EOF / Ctrl-C                                      │
/// │                                                                         │
/// │  6. Teardown: worker drained → autosave flushed → pool closed           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config_path: Option<PathBuf>) -> DeskResult<()> {
    let config = DeskConfig::load(config_path)?;
    init_tracing(&config.logging.filter);

    info!(store = %config.store.name, "Starting Billbook Desk");

    let db_path = config.database_path()?;
    info!(?db_path, "Database path determined");
    let db = Database::new(DbConfig::new(db_path)).await?;

    let config_state = ConfigState::from(&config);
    let cart = match restore_draft(&db.store()).await? {
        Some(cart) => cart,
        None => Cart::new(
            config_state.default_discount_percent,
            config_state.default_tax_percent,
        ),
    };
    let cart_state = CartState::new(cart);

    let autosave = DraftAutosave::spawn(db.store(), cart_state.clone(), config.autosave_interval());

    let (bus, worker) = CommandBus::spawn(WorkerState {
        db: DbState::new(db.clone()),
        cart: cart_state,
        config: config_state,
    });
    info!("State initialized");

    let ctrl_c = async {
        // If the handler can't be installed, run until stdin closes.
        let _ = tokio::signal::ctrl_c().await;
    };
    let mut stdout = tokio::io::stdout();
    let served = frontend::serve(&bus, BufReader::new(tokio::io::stdin()), &mut stdout, ctrl_c).await;

    drop(bus);
    if let Err(e) = worker.await {
        tracing::error!(?e, "Command worker failed");
    }
    autosave.shutdown().await;
    db.close().await;

    info!("Billbook Desk stopped");
    Ok(served?)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=billbook_db=trace` - Trace for one crate only
/// - Default: the config file's `logging.filter`
///
/// Writes to stderr; stdout carries replies.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
