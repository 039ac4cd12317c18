//! Core domain types for the rental order engine

pub mod error;
pub mod fine;
pub mod order;
pub mod status;

pub use error::{EngineError, EngineResult};
pub use fine::{FineAssessment, FinePolicy, FineStatus};
pub use order::{Order, OrderDraft, OrderId, OrderPatch, OrderSnapshot};
pub use status::{OrderCommand, OrderStatus};
