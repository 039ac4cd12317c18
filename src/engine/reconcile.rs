//! Background fine reconciliation
//!
//! Fines are a function of wall-clock time, not of user action, so the
//! persisted fine fields drift stale on their own. The reconciler rides
//! the collection's snapshot feed: every time any write lands in the
//! collection, it re-assesses every order and merges changed, non-trivial
//! fine values back into the store.
//!
//! ```text
//! DocumentStore ──watch──▶ Reconciler::run()
//!                               │  for each order in snapshot
//!                               │  assess(order, now)
//!                               │  changed and levied?
//!                               └──merge(fineAmount, fineStatus)──▶ DocumentStore
//! ```
//!
//! Persistence is best-effort: an order with no activity can sit past its
//! grace period without its *stored* fine advancing, because no snapshot
//! fires. Display stays correct regardless, since every consumer-facing
//! read recomputes fines fresh (see [`crate::engine::OrderFeed`]). Write
//! failures here are logged and never surfaced; no user initiated them.
//!
//! The sweep is idempotent: its own merge triggers one more snapshot,
//! which re-assesses to the same values and writes nothing further.

use crate::core::fine::FinePolicy;
use crate::core::order::{OrderPatch, OrderSnapshot};
use crate::storage::DocumentStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Snapshot-driven reconciliation of persisted fine fields.
pub struct Reconciler {
    backend: Arc<dyn DocumentStore>,
    policy: FinePolicy,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn DocumentStore>, policy: FinePolicy) -> Self {
        Self { backend, policy }
    }

    /// Spawn the reconciliation loop on the current runtime. The task ends
    /// when the backing store's feed closes; abort the handle to stop it
    /// earlier. In-flight writes complete or fail on their own either way.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the reconciliation loop: sweep the current snapshot, then once
    /// per snapshot delivery.
    pub async fn run(self) {
        let mut feed = self.backend.watch();
        tracing::debug!("fine reconciliation started");
        loop {
            let snapshot = feed.borrow_and_update().clone();
            self.sweep(&snapshot).await;
            if feed.changed().await.is_err() {
                tracing::debug!("order feed closed, stopping fine reconciliation");
                break;
            }
        }
    }

    /// Re-assess every order in `snapshot` and persist recomputed fines.
    async fn sweep(&self, snapshot: &OrderSnapshot) {
        let now = Utc::now();
        for order in snapshot {
            // Fines under manual resolution are owned by update_fine.
            if order.fine_status.is_settling() {
                continue;
            }
            let assessed = self.policy.assess(order, now);
            if !assessed.is_levied() {
                continue;
            }
            if assessed.amount == order.fine_amount && assessed.status == order.fine_status {
                continue;
            }
            let patch = OrderPatch::fine(assessed.amount, assessed.status);
            match self.backend.merge(order.id, patch).await {
                Ok(()) => {
                    tracing::debug!(
                        order_id = %order.id,
                        amount = assessed.amount,
                        status = %assessed.status,
                        "persisted recomputed fine"
                    );
                }
                Err(error) => {
                    // Best-effort path: log and move on, the next snapshot
                    // will try again.
                    tracing::warn!(order_id = %order.id, %error, "failed to persist recomputed fine");
                }
            }
        }
    }
}
