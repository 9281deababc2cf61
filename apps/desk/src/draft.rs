//! # Draft Autosave
//!
//! Keeps the in-progress cart under the `billDraft` key so an interrupted
//! session picks up where it stopped.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Lifecycle                                      │
//! │                                                                         │
//! │  startup ──► restore_draft() ──► CartState                              │
//! │                                      │                                  │
//! │             ┌────────────────────────┘                                  │
//! │             ▼                                                           │
//! │  DraftAutosave::run()                                                   │
//! │    every tick: revision changed? ──► persist_draft()                    │
//! │                                        • cart empty → key removed       │
//! │                                        • otherwise  → cart saved        │
//! │                                                                         │
//! │  checkoutCart ──► bill committed ──► cart cleared ──► discard_draft()   │
//! │                                                                         │
//! │  shutdown ──► handle.shutdown() ──► one final flush ──► task ends       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use billbook_db::{keys, DbError, DbResult, KvStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::state::{Cart, CartState};

/// Loads the saved draft, if any.
///
/// An unreadable draft, or one whose totals overflow, is logged and dropped
/// rather than blocking startup.
pub async fn restore_draft(store: &KvStore) -> DbResult<Option<Cart>> {
    match store.load_value::<Cart>(keys::BILL_DRAFT).await {
        Ok(Some(cart)) => match cart.totals() {
            Ok(_) => {
                info!(items = cart.item_count(), "Restored bill draft");
                Ok(Some(cart))
            }
            Err(e) => {
                warn!(error = %e, "Discarding bill draft with unusable totals");
                store.remove(keys::BILL_DRAFT).await?;
                Ok(None)
            }
        },
        Ok(None) => Ok(None),
        Err(DbError::Serialization(e)) => {
            warn!(error = %e, "Discarding unreadable bill draft");
            store.remove(keys::BILL_DRAFT).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Saves the cart as the current draft. An empty cart removes the draft.
pub async fn persist_draft(store: &KvStore, cart: &Cart) -> DbResult<()> {
    if cart.is_empty() {
        store.remove(keys::BILL_DRAFT).await?;
    } else {
        store.save_value(keys::BILL_DRAFT, cart).await?;
    }
    Ok(())
}

/// Removes the draft after its bill has been committed.
pub async fn discard_draft(store: &KvStore) -> DbResult<()> {
    if store.remove(keys::BILL_DRAFT).await? {
        debug!("Bill draft discarded");
    }
    Ok(())
}

// =============================================================================
// Autosave Task
// =============================================================================

/// Background task persisting the cart on an interval.
pub struct DraftAutosave {
    store: KvStore,
    cart: CartState,
    interval: Duration,
    /// Revision last written to the store.
    saved_revision: u64,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the autosave task.
pub struct DraftAutosaveHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl DraftAutosave {
    /// Spawns the task. The cart's current revision counts as saved.
    pub fn spawn(store: KvStore, cart: CartState, interval: Duration) -> DraftAutosaveHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let autosave = DraftAutosave {
            store,
            saved_revision: cart.revision(),
            cart,
            interval,
            shutdown_rx,
        };

        let task = tokio::spawn(autosave.run());
        DraftAutosaveHandle { shutdown_tx, task }
    }

    async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "Draft autosave starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.flush().await {
                        error!(?e, "Failed to autosave bill draft");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Draft autosave shutting down");
                    break;
                }
            }
        }

        if let Err(e) = self.flush().await {
            error!(?e, "Failed to save bill draft on shutdown");
        }

        info!("Draft autosave stopped");
    }

    /// Writes the cart if it changed since the last write.
    async fn flush(&mut self) -> DbResult<()> {
        let (cart, revision) = self.cart.snapshot();
        if revision == self.saved_revision {
            return Ok(());
        }

        persist_draft(&self.store, &cart).await?;
        self.saved_revision = revision;

        debug!(revision, items = cart.item_count(), "Bill draft saved");
        Ok(())
    }
}

impl DraftAutosaveHandle {
    /// Stops the task after one final flush and waits for it to finish.
    pub async fn shutdown(self) {
        // A closed channel means the task already ended.
        let _ = self.shutdown_tx.send(()).await;

        if let Err(e) = self.task.await {
            error!(?e, "Draft autosave task failed");
        }
    }
}
