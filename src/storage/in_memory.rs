//! In-memory implementation of the document store
//!
//! Useful for tests, demos and single-process deployments. Documents live
//! in an `RwLock<IndexMap>`; every mutation publishes a freshly sorted
//! snapshot of the whole collection on a `tokio::sync::watch` channel,
//! which gives subscribers exactly the live-query semantics the engine
//! expects: current state immediately, then one full snapshot per change.

use crate::core::order::{Order, OrderId, OrderPatch, OrderSnapshot};
use crate::storage::DocumentStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// In-memory order collection with live snapshots.
///
/// Cheap to clone; all clones share the same collection and snapshot
/// channel.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    inner: Arc<Inner>,
}

struct Inner {
    documents: RwLock<IndexMap<OrderId, Order>>,
    snapshots: watch::Sender<OrderSnapshot>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(OrderSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                documents: RwLock::new(IndexMap::new()),
                snapshots,
            }),
        }
    }

    /// Rebuild and publish the collection snapshot, ordered by `created_at`
    /// descending (id as a stable tie-break).
    fn publish(&self) -> Result<()> {
        let mut orders: Vec<Order> = {
            let documents = self
                .inner
                .documents
                .read()
                .map_err(|e| anyhow!("document lock poisoned: {e}"))?;
            documents.values().cloned().collect()
        };
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        // send_replace never fails; a snapshot with no subscribers is fine.
        self.inner.snapshots.send_replace(OrderSnapshot::new(orders));
        Ok(())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, mut order: Order) -> Result<OrderId> {
        let id = OrderId::new();
        order.id = id;
        order.recorded_at = Utc::now();
        {
            let mut documents = self
                .inner
                .documents
                .write()
                .map_err(|e| anyhow!("document lock poisoned: {e}"))?;
            documents.insert(id, order);
        }
        self.publish()?;
        Ok(id)
    }

    async fn merge(&self, id: OrderId, patch: OrderPatch) -> Result<()> {
        {
            let mut documents = self
                .inner
                .documents
                .write()
                .map_err(|e| anyhow!("document lock poisoned: {e}"))?;
            let order = documents
                .get_mut(&id)
                .ok_or_else(|| anyhow!("order '{id}' not found"))?;
            patch.apply(order);
        }
        self.publish()
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let documents = self
            .inner
            .documents
            .read()
            .map_err(|e| anyhow!("document lock poisoned: {e}"))?;
        Ok(documents.get(&id).cloned())
    }

    fn watch(&self) -> watch::Receiver<OrderSnapshot> {
        self.inner.snapshots.subscribe()
    }
}
