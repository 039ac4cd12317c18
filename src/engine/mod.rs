//! The order store: single write path and live read path
//!
//! [`OrderStore`] owns every mutation of the `orders` collection and the
//! live subscription handed to rendering surfaces. Two principles shape
//! it:
//!
//! - **Enforced transitions.** Status changes go through the state machine
//!   in [`crate::core::status`]; a caller supplies an [`OrderCommand`] and
//!   the store computes (and validates) the next status from the stored
//!   current one. Arbitrary status overwrites are not possible.
//! - **Fresh fines on every read.** Orders returned by [`OrderStore::get_order`]
//!   and delivered by [`OrderFeed`] carry fine fields recomputed from the
//!   wall clock at read time. What is *displayed* is always correct even
//!   when the background persistence of fines (see
//!   [`reconcile`](crate::engine::reconcile)) lags behind.
//!
//! Write failures surface to the immediate caller and are never retried.
//! The store keeps no optimistic local state, so there is nothing to roll
//! back; its visible state is whatever the last snapshot said.

pub mod reconcile;

pub use reconcile::Reconciler;

use crate::core::error::{EngineError, EngineResult};
use crate::core::fine::{FinePolicy, FineStatus};
use crate::core::order::{Order, OrderDraft, OrderId, OrderPatch, OrderSnapshot};
use crate::core::status::{OrderCommand, OrderStatus};
use crate::storage::DocumentStore;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

/// The canonical order collection service.
///
/// Cheap to clone; clones share the backend and policy.
#[derive(Clone)]
pub struct OrderStore {
    backend: Arc<dyn DocumentStore>,
    policy: FinePolicy,
}

impl OrderStore {
    pub fn new(backend: Arc<dyn DocumentStore>, policy: FinePolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &FinePolicy {
        &self.policy
    }

    /// Create a rental order from the storefront's confirmation payload.
    ///
    /// The draft is validated, then persisted with the creation defaults:
    /// status `Pending`, zero fine, a client timestamp for collection
    /// ordering. The store assigns the id and the server timestamp.
    pub async fn create_order(&self, draft: OrderDraft) -> EngineResult<OrderId> {
        draft.validate()?;
        let order = draft.into_order(Utc::now().timestamp_millis());
        let id = self.backend.create(order).await?;
        tracing::debug!(order_id = %id, "order created");
        Ok(id)
    }

    /// Apply a lifecycle command to an order.
    ///
    /// The next status is computed from the stored current status; a
    /// command the state machine does not allow from there is rejected
    /// with [`EngineError::InvalidTransition`]. Returns the new status.
    pub async fn update_status(
        &self,
        id: OrderId,
        command: OrderCommand,
    ) -> EngineResult<OrderStatus> {
        let order = self.load(id).await?;
        let next = order
            .status
            .apply(command)
            .ok_or(EngineError::InvalidTransition {
                from: order.status,
                command,
            })?;
        self.backend.merge(id, OrderPatch::status(next)).await?;
        tracing::debug!(order_id = %id, from = %order.status, to = %next, "order status updated");
        Ok(next)
    }

    /// Overwrite an order's fine status (payment-proof submission or
    /// settlement). Never touches the fine amount.
    ///
    /// Marking a fine `Paid` requires payment proof, either supplied here
    /// or already stored on the order.
    pub async fn update_fine(
        &self,
        id: OrderId,
        fine_status: FineStatus,
        fine_proof: Option<String>,
    ) -> EngineResult<()> {
        let order = self.load(id).await?;
        if fine_status == FineStatus::Paid && fine_proof.is_none() && order.fine_proof.is_none() {
            return Err(EngineError::MissingFineProof);
        }
        self.backend
            .merge(id, OrderPatch::fine_resolution(fine_status, fine_proof))
            .await?;
        tracing::debug!(order_id = %id, fine_status = %fine_status, "fine status updated");
        Ok(())
    }

    /// One-shot read for detail views, outside the live path. The returned
    /// order carries freshly assessed fine fields.
    pub async fn get_order(&self, id: OrderId) -> EngineResult<Order> {
        let mut order = self.load(id).await?;
        overlay_fine(&self.policy, &mut order, Utc::now());
        Ok(order)
    }

    /// Subscribe to the live collection. The feed yields the full current
    /// snapshot immediately, then one full snapshot per collection change,
    /// each order overlaid with a fresh fine assessment.
    pub fn subscribe(&self) -> OrderFeed {
        OrderFeed {
            stream: WatchStream::new(self.backend.watch()),
            policy: self.policy.clone(),
        }
    }

    async fn load(&self, id: OrderId) -> EngineResult<Order> {
        self.backend
            .get(id)
            .await?
            .ok_or(EngineError::OrderNotFound(id))
    }
}

/// Overlay the freshly computed fine onto an order for display.
///
/// Orders whose fine has entered the manual resolution path (`pending` or
/// `paid`) keep their stored values; recomputing would clobber a
/// settlement in progress.
fn overlay_fine(policy: &FinePolicy, order: &mut Order, now: DateTime<Utc>) {
    if order.fine_status.is_settling() {
        return;
    }
    let assessed = policy.assess(order, now);
    order.fine_amount = assessed.amount;
    order.fine_status = assessed.status;
}

pub(crate) fn overlay_snapshot(
    policy: &FinePolicy,
    mut snapshot: OrderSnapshot,
    now: DateTime<Utc>,
) -> OrderSnapshot {
    for order in snapshot.orders_mut() {
        overlay_fine(policy, order, now);
    }
    snapshot
}

/// Live, restartable view of the order collection.
///
/// Infinite: `next` yields `None` only once the backing store is gone.
/// Dropping the feed tears the subscription down; in-flight writes are
/// unaffected.
pub struct OrderFeed {
    stream: WatchStream<OrderSnapshot>,
    policy: FinePolicy,
}

impl OrderFeed {
    /// The next snapshot: the current collection state on the first call,
    /// then one per collection change.
    pub async fn next(&mut self) -> Option<OrderSnapshot> {
        let snapshot = self.stream.next().await?;
        Some(overlay_snapshot(&self.policy, snapshot, Utc::now()))
    }

    /// Adapt the feed into a `futures::Stream` of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = OrderSnapshot> + Send {
        let policy = self.policy;
        self.stream
            .map(move |snapshot| overlay_snapshot(&policy, snapshot, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fine::FineAssessment;
    use crate::core::order::OrderDraft;

    fn overdue_accepted_order() -> Order {
        let mut order = Order::sample();
        order.status = OrderStatus::Accepted;
        order.rental_end_date = Some("2020-01-01".into());
        order
    }

    #[test]
    fn test_overlay_replaces_stale_persisted_fine() {
        let policy = FinePolicy::default();
        let mut order = overdue_accepted_order();
        order.fine_amount = 0;
        order.fine_status = FineStatus::None;

        overlay_fine(&policy, &mut order, Utc::now());
        // Years overdue: the forfeit band applies regardless of what was
        // persisted.
        assert_eq!(order.fine_amount, order.product_price);
        assert_eq!(order.fine_status, FineStatus::Unpaid);
    }

    #[test]
    fn test_overlay_leaves_settling_fines_alone() {
        let policy = FinePolicy::default();
        let mut order = overdue_accepted_order();
        order.fine_amount = 2000;
        order.fine_status = FineStatus::Pending;
        order.fine_proof = Some("receipt-9".into());

        overlay_fine(&policy, &mut order, Utc::now());
        assert_eq!(order.fine_amount, 2000);
        assert_eq!(order.fine_status, FineStatus::Pending);
    }

    #[test]
    fn test_overlay_clears_phantom_fine() {
        // A persisted fine on an order that no longer qualifies (e.g. the
        // return was confirmed) is displayed as no fine.
        let policy = FinePolicy::default();
        let mut order = overdue_accepted_order();
        order.status = OrderStatus::ReturnAccepted;
        order.fine_amount = 4000;
        order.fine_status = FineStatus::Unpaid;

        overlay_fine(&policy, &mut order, Utc::now());
        assert_eq!(
            FineAssessment {
                amount: order.fine_amount,
                status: order.fine_status
            },
            FineAssessment::NONE
        );
    }

    #[test]
    fn test_draft_sample_is_valid() {
        assert!(OrderDraft::sample().validate().is_ok());
    }
}
