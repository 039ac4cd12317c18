//! Storage boundary for the `orders` collection
//!
//! The engine treats persistence as a black box with document-database
//! semantics: create a document and get back its assigned id, merge a
//! partial field map into a document, read one document, and subscribe to
//! the collection as a stream of full, ordered snapshots. Writes are
//! last-write-wins; there is no version field and no transactional guard.
//! That weak model is acceptable here because fine recomputation is
//! idempotent and status changes are human-paced.

pub mod in_memory;

pub use in_memory::InMemoryDocumentStore;

use crate::core::order::{Order, OrderId, OrderPatch, OrderSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Backend contract for the order collection.
///
/// Errors at this boundary are opaque (`anyhow`); the engine wraps them
/// without interpreting them.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new order document. The store assigns the id and the
    /// server timestamp, replacing whatever placeholders the caller left
    /// in those fields, and returns the assigned id.
    async fn create(&self, order: Order) -> Result<OrderId>;

    /// Merge a partial update into an existing document, last-write-wins.
    /// Fails if the id is unknown.
    async fn merge(&self, id: OrderId, patch: OrderPatch) -> Result<()>;

    /// Read a single document by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Subscribe to the collection. The receiver observes the current full
    /// snapshot immediately and a new full snapshot (ordered by
    /// `created_at` descending) after every write to the collection.
    fn watch(&self) -> watch::Receiver<OrderSnapshot>;
}
