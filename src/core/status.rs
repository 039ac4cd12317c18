//! Order lifecycle state machine
//!
//! The status strings are the document wire format used by the storefront,
//! which is why several variants serialize with a space ("Return Pending").
//! Transitions are driven by [`OrderCommand`]s rather than raw status
//! overwrites: the store computes the next status from the current one and
//! rejects anything the table below does not allow.
//!
//! ```text
//! Pending ──accept──▶ Accepted ──request_return──▶ Return Pending
//!    │                   │                              │──confirm_return──▶ Return Accepted
//!    │──reject──▶ Rejected                              │──reject_return───▶ Return Rejected
//!    │──cancel──▶ Cancelled                                  (request_return again to retry)
//! Accepted ──ship──▶ Shipped ──complete──▶ Completed
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a rental order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Shipped,
    Completed,
    Cancelled,
    #[serde(rename = "Return Pending")]
    ReturnPending,
    /// Some storefront screens historically wrote "Return Confirmed" for the
    /// same state, so both spellings deserialize to this variant.
    #[serde(rename = "Return Accepted", alias = "Return Confirmed")]
    ReturnAccepted,
    #[serde(rename = "Return Rejected")]
    ReturnRejected,
}

/// A transition request against the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderCommand {
    /// Admin accepts a pending rental request.
    Accept,
    /// Admin rejects a pending rental request.
    Reject,
    /// Requester withdraws a pending rental request.
    Cancel,
    /// Admin dispatches the accepted item.
    Ship,
    /// Admin closes out a shipped rental.
    Complete,
    /// Requester asks to return the item.
    RequestReturn,
    /// Admin confirms the returned item.
    ConfirmReturn,
    /// Admin rejects the return (condition, missing pieces, ...).
    RejectReturn,
}

impl OrderStatus {
    /// The wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::ReturnPending => "Return Pending",
            OrderStatus::ReturnAccepted => "Return Accepted",
            OrderStatus::ReturnRejected => "Return Rejected",
        }
    }

    /// Compute the status reached by applying `command`, or `None` when the
    /// transition is not allowed from this status.
    pub fn apply(self, command: OrderCommand) -> Option<OrderStatus> {
        use OrderCommand::*;
        use OrderStatus::*;

        match (self, command) {
            (Pending, Accept) => Some(Accepted),
            (Pending, Reject) => Some(Rejected),
            (Pending, Cancel) => Some(Cancelled),
            (Accepted, Ship) => Some(Shipped),
            (Accepted, RequestReturn) => Some(ReturnPending),
            (Shipped, Complete) => Some(Completed),
            (ReturnPending, ConfirmReturn) => Some(ReturnAccepted),
            (ReturnPending, RejectReturn) => Some(ReturnRejected),
            // A rejected return can be resubmitted once the issue is fixed.
            (ReturnRejected, RequestReturn) => Some(ReturnPending),
            _ => None,
        }
    }

    /// Whether no further transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Rejected
                | OrderStatus::Cancelled
                | OrderStatus::Completed
                | OrderStatus::ReturnAccepted
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OrderCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderCommand::Accept => "accept",
            OrderCommand::Reject => "reject",
            OrderCommand::Cancel => "cancel",
            OrderCommand::Ship => "ship",
            OrderCommand::Complete => "complete",
            OrderCommand::RequestReturn => "request_return",
            OrderCommand::ConfirmReturn => "confirm_return",
            OrderCommand::RejectReturn => "reject_return",
        }
    }
}

impl fmt::Display for OrderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
