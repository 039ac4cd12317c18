//! # Vestra
//!
//! Rental order and fine engine for client-rendered rental storefronts.
//!
//! The storefront around this crate (catalog, routing, auth, wishlists,
//! admin screens) is thin glue over a document database; the one piece
//! with real business rules is the rental lifecycle and its late-fee
//! accrual. Vestra is that piece, consolidated:
//!
//! - **Order store**: the canonical live collection of rental orders, the
//!   single write path (create / lifecycle transitions / fine resolution),
//!   and a live snapshot feed ordered by creation time.
//! - **Fine calculator**: a pure policy function from an order snapshot and
//!   the current instant to a fine amount and status, with a grace window,
//!   tiered per-day rates and price forfeiture.
//! - **Reconciliation loop**: a background task that keeps persisted fine
//!   fields eventually consistent with the calculator, piggybacking on the
//!   collection's change feed rather than a timer.
//!
//! Displayed fines are always computed fresh at read time; persisted fines
//! are best-effort. The two paths are deliberately decoupled.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vestra::prelude::*;
//!
//! let backend = Arc::new(InMemoryDocumentStore::new());
//! let policy = EngineConfig::from_yaml_file("vestra.yaml")?.fine;
//!
//! let store = OrderStore::new(backend.clone(), policy.clone());
//! Reconciler::new(backend, policy).spawn();
//!
//! let id = store.create_order(draft).await?;
//! store.update_status(id, OrderCommand::Accept).await?;
//!
//! let mut feed = store.subscribe();
//! while let Some(snapshot) = feed.next().await {
//!     for order in snapshot.for_user("uid-123") {
//!         println!("{}: {} ({})", order.product_title, order.status, order.fine_status);
//!     }
//! }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core domain ===
    pub use crate::core::{
        EngineError, EngineResult, FineAssessment, FinePolicy, FineStatus, Order, OrderCommand,
        OrderDraft, OrderId, OrderPatch, OrderSnapshot, OrderStatus,
    };

    // === Engine ===
    pub use crate::engine::{OrderFeed, OrderStore, Reconciler};

    // === Storage ===
    pub use crate::storage::{DocumentStore, InMemoryDocumentStore};

    // === Config ===
    pub use crate::config::EngineConfig;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
