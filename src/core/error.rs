//! Typed errors for the engine's service surface
//!
//! The engine distinguishes the failures a caller can act on (invalid
//! draft, invalid transition, missing proof, unknown order) from opaque
//! storage failures, which are wrapped as [`EngineError::Backend`].
//! Background reconciliation never surfaces errors to callers; its write
//! failures are logged only.

use crate::core::order::OrderId;
use crate::core::status::{OrderCommand, OrderStatus};
use thiserror::Error;

/// Errors surfaced by [`OrderStore`](crate::engine::OrderStore) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No order with the given id exists in the collection.
    #[error("order '{0}' not found")]
    OrderNotFound(OrderId),

    /// The requested transition is not allowed from the order's current
    /// status.
    #[error("cannot apply '{command}' to an order in status '{from}'")]
    InvalidTransition {
        from: OrderStatus,
        command: OrderCommand,
    },

    /// The creation payload failed validation.
    #[error("invalid order draft: {0}")]
    InvalidDraft(String),

    /// A fine can only be marked paid when payment proof is available.
    #[error("a fine cannot be marked paid without payment proof")]
    MissingFineProof,

    /// The document store rejected a read or write. Not retried; the
    /// engine holds no local state to roll back.
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
