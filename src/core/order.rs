//! Order documents and their partial updates
//!
//! An [`Order`] is one rental request, denormalized the way the storefront
//! stores it: the requester's contact snapshot, the product snapshot, the
//! rental window, the lifecycle status and the fine fields all live on the
//! same document. Serde renames carry the exact wire names of the `orders`
//! collection (`userId`, `productPrice`, `fineStatus`, ...), so a document
//! round-trips unchanged through this crate.
//!
//! Rental dates are kept as the raw `YYYY-MM-DD` strings the rental form
//! submitted. They are validated once at creation (end not before start)
//! and parsed leniently afterwards; a malformed date simply never accrues
//! a fine.

use crate::core::error::{EngineError, EngineResult};
use crate::core::fine::FineStatus;
use crate::core::status::OrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, store-assigned order identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a fresh identifier. Normally only the document store does
    /// this; everything else treats ids as opaque.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil id, used as a placeholder before the store assigns one.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rental order document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: OrderId,

    // Requester snapshot, captured at creation time.
    #[serde(rename = "userId")]
    pub user_id: String,
    pub customer: String,
    pub email: String,
    pub mobile: String,
    pub city: String,
    pub postal: String,
    pub address: String,

    // Product snapshot. `product_price` is the stored TOTAL rental price
    // (per-day price x days), which the forfeit fine band applies as-is.
    #[serde(rename = "productTitle")]
    pub product_title: String,
    #[serde(rename = "productPrice")]
    pub product_price: i64,
    #[serde(rename = "productImage", default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,

    // Rental window, raw form input. `duration` is the human-readable day
    // count captured at creation; it is never re-derived from the dates.
    pub duration: String,
    #[serde(
        rename = "rentalStartDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rental_start_date: Option<String>,
    #[serde(
        rename = "rentalEndDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rental_end_date: Option<String>,

    pub status: OrderStatus,

    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(
        rename = "paymentScreenshot",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_screenshot: Option<String>,

    #[serde(rename = "fineAmount", default)]
    pub fine_amount: i64,
    #[serde(rename = "fineStatus", default)]
    pub fine_status: FineStatus,
    #[serde(rename = "fineProof", default, skip_serializing_if = "Option::is_none")]
    pub fine_proof: Option<String>,

    /// Client-assigned creation instant in epoch milliseconds; the
    /// collection's ordering key.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Server-assigned timestamp. Authoritative for audit, unused by the
    /// business logic.
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

/// Caller-supplied payload for a new order: everything except the fields
/// the engine or the store assigns (id, status, fines, timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub customer: String,
    pub email: String,
    pub mobile: String,
    pub city: String,
    pub postal: String,
    pub address: String,
    #[serde(rename = "productTitle")]
    pub product_title: String,
    #[serde(rename = "productPrice")]
    pub product_price: i64,
    #[serde(rename = "productImage", default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    pub duration: String,
    #[serde(
        rename = "rentalStartDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rental_start_date: Option<String>,
    #[serde(
        rename = "rentalEndDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rental_end_date: Option<String>,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(
        rename = "paymentScreenshot",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_screenshot: Option<String>,
}

impl OrderDraft {
    /// Creation-time validation. The acting identity and the rental window
    /// must be present, and when both dates parse the end may not precede
    /// the start. This is the only place the window is validated; later
    /// reads parse the dates leniently.
    pub fn validate(&self) -> EngineResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(EngineError::InvalidDraft("missing requester id".into()));
        }
        if self.customer.trim().is_empty() {
            return Err(EngineError::InvalidDraft("missing customer name".into()));
        }
        if self.product_price < 0 {
            return Err(EngineError::InvalidDraft(format!(
                "negative product price: {}",
                self.product_price
            )));
        }
        if let (Some(start), Some(end)) = (
            self.rental_start_date.as_deref().and_then(parse_date),
            self.rental_end_date.as_deref().and_then(parse_date),
        ) && end < start
        {
            return Err(EngineError::InvalidDraft(format!(
                "rental end {end} precedes start {start}"
            )));
        }
        Ok(())
    }

    /// Build the order document with the creation defaults: status
    /// `Pending`, no fine, the given client timestamp. The id and server
    /// timestamp are placeholders the document store replaces on create.
    pub fn into_order(self, created_at: i64) -> Order {
        Order {
            id: OrderId::nil(),
            user_id: self.user_id,
            customer: self.customer,
            email: self.email,
            mobile: self.mobile,
            city: self.city,
            postal: self.postal,
            address: self.address,
            product_title: self.product_title,
            product_price: self.product_price,
            product_image: self.product_image,
            duration: self.duration,
            rental_start_date: self.rental_start_date,
            rental_end_date: self.rental_end_date,
            status: OrderStatus::Pending,
            payment_method: self.payment_method,
            payment_screenshot: self.payment_screenshot,
            fine_amount: 0,
            fine_status: FineStatus::None,
            fine_proof: None,
            created_at,
            recorded_at: Utc::now(),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// A partial update merged into a stored order, last-write-wins.
///
/// Only fields the engine actually mutates after creation are
/// representable: the lifecycle status and the fine fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(rename = "fineAmount", default, skip_serializing_if = "Option::is_none")]
    pub fine_amount: Option<i64>,
    #[serde(rename = "fineStatus", default, skip_serializing_if = "Option::is_none")]
    pub fine_status: Option<FineStatus>,
    #[serde(rename = "fineProof", default, skip_serializing_if = "Option::is_none")]
    pub fine_proof: Option<String>,
}

impl OrderPatch {
    /// Status-only patch, issued by `update_status`.
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Recomputed fine fields, issued by the reconciliation loop.
    pub fn fine(amount: i64, status: FineStatus) -> Self {
        Self {
            fine_amount: Some(amount),
            fine_status: Some(status),
            ..Self::default()
        }
    }

    /// Fine resolution (proof submission / settlement). Never touches the
    /// amount; the proof is only written when one is supplied.
    pub fn fine_resolution(status: FineStatus, proof: Option<String>) -> Self {
        Self {
            fine_status: Some(status),
            fine_proof: proof,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge this patch into `order`.
    pub fn apply(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(amount) = self.fine_amount {
            order.fine_amount = amount;
        }
        if let Some(status) = self.fine_status {
            order.fine_status = status;
        }
        if let Some(proof) = &self.fine_proof {
            order.fine_proof = Some(proof.clone());
        }
    }
}

/// One full state of the `orders` collection, ordered by `created_at`
/// descending. Every subscription delivery carries a complete snapshot,
/// not a diff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSnapshot {
    orders: Vec<Order>,
}

impl OrderSnapshot {
    /// Wrap an already-ordered list of orders.
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }

    /// Look up a single order in the snapshot.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    /// The orders owned by `user_id`, preserving the snapshot ordering.
    /// The acting identity is always passed in explicitly; the engine holds
    /// no ambient "current user".
    pub fn for_user(&self, user_id: &str) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect()
    }

    pub(crate) fn orders_mut(&mut self) -> &mut [Order] {
        &mut self.orders
    }
}

impl<'a> IntoIterator for &'a OrderSnapshot {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

#[cfg(test)]
impl Order {
    /// A fully populated order for unit tests.
    pub(crate) fn sample() -> Self {
        OrderDraft::sample().into_order(1_700_000_000_000)
    }
}

#[cfg(test)]
impl OrderDraft {
    pub(crate) fn sample() -> Self {
        Self {
            user_id: "uid-romaisa".into(),
            customer: "Romaisa Khan".into(),
            email: "romaisa@example.com".into(),
            mobile: "0300-1234567".into(),
            city: "Lahore".into(),
            postal: "54000".into(),
            address: "12-B Gulberg III".into(),
            product_title: "Emerald Formal Gown".into(),
            product_price: 12000,
            product_image: Some("https://img.example.com/gown.jpg".into()),
            duration: "3 Days".into(),
            rental_start_date: Some("2025-01-01".into()),
            rental_end_date: Some("2025-01-04".into()),
            payment_method: "Cash".into(),
            payment_screenshot: None,
        }
    }
}
