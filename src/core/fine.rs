//! Late-fee (fine) assessment
//!
//! [`FinePolicy::assess`] is the single source of truth for fines. It is a
//! pure, total function of an order snapshot and the current instant. It
//! does no I/O and never errors, so callers re-evaluate it on every read
//! and every snapshot; for a fixed `now` the result is always the same.
//!
//! A fine accrues only for orders in status `Accepted` with a parseable
//! rental end date. The renter gets a grace window after the end date;
//! past it, a per-day rate applies in two tiers, and beyond the second tier
//! the stored rental price is forfeited.

use crate::core::order::Order;
use crate::core::status::OrderStatus;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment state of an order's fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FineStatus {
    /// No fine applies.
    #[default]
    None,
    /// A fine has accrued and is outstanding.
    Unpaid,
    /// The renter submitted payment proof; awaiting admin confirmation.
    Pending,
    /// The fine is settled.
    Paid,
}

impl FineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FineStatus::None => "none",
            FineStatus::Unpaid => "unpaid",
            FineStatus::Pending => "pending",
            FineStatus::Paid => "paid",
        }
    }

    /// Whether the fine is in the manual resolution path (proof submitted or
    /// settled). Reconciliation leaves such orders alone.
    pub fn is_settling(&self) -> bool {
        matches!(self, FineStatus::Pending | FineStatus::Paid)
    }
}

impl fmt::Display for FineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of assessing an order against a [`FinePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineAssessment {
    /// Fine amount in whole currency units, always >= 0.
    pub amount: i64,
    /// `Unpaid` when `amount > 0`, otherwise `None`.
    pub status: FineStatus,
}

impl FineAssessment {
    /// The "no fine applies" result.
    pub const NONE: FineAssessment = FineAssessment {
        amount: 0,
        status: FineStatus::None,
    };

    /// Whether this assessment represents an actual fine.
    pub fn is_levied(&self) -> bool {
        self.amount > 0 || self.status != FineStatus::None
    }
}

/// Late-fee policy table.
///
/// All knobs are serde-loaded with defaults, so an empty config section
/// yields the storefront's production policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinePolicy {
    /// Hours past the rental end date before any fine accrues.
    pub grace_hours: i64,
    /// Per-day rate for the first tier of lateness.
    pub tier_one_rate: i64,
    /// Last day (inclusive) charged at the first-tier rate.
    pub tier_one_max_days: i64,
    /// Per-day rate for the second tier.
    pub tier_two_rate: i64,
    /// Last day (inclusive) charged at the second-tier rate; beyond it the
    /// stored rental price is forfeited.
    pub tier_two_max_days: i64,
    /// Multiplier applied to the stored price in the forfeit band. The
    /// storefront's views disagreed on this (1 vs 20); 1 is the default.
    pub forfeit_multiplier: i64,
}

impl Default for FinePolicy {
    fn default() -> Self {
        Self {
            grace_hours: 4,
            tier_one_rate: 1000,
            tier_one_max_days: 2,
            tier_two_rate: 2000,
            tier_two_max_days: 14,
            forfeit_multiplier: 1,
        }
    }
}

impl FinePolicy {
    /// Assess the fine for `order` as of `now`.
    ///
    /// Returns [`FineAssessment::NONE`] whenever the preconditions fail:
    /// order not `Accepted`, end date missing or unparseable, or `now`
    /// still inside the grace window. Day counting uses the raw end date
    /// (midnight UTC), not the grace-adjusted instant.
    pub fn assess(&self, order: &Order, now: DateTime<Utc>) -> FineAssessment {
        if order.status != OrderStatus::Accepted {
            return FineAssessment::NONE;
        }
        let Some(end_date) = order
            .rental_end_date
            .as_deref()
            .and_then(parse_calendar_date)
        else {
            return FineAssessment::NONE;
        };

        let end_instant = end_date.and_time(NaiveTime::MIN).and_utc();
        let grace_end = end_instant + Duration::hours(self.grace_hours);
        if now <= grace_end {
            return FineAssessment::NONE;
        }

        let diff_days = (now - end_instant).num_days();
        let amount = if diff_days <= 0 {
            // Past grace but within the first 24h: the day bands start at 1.
            0
        } else if diff_days <= self.tier_one_max_days {
            diff_days * self.tier_one_rate
        } else if diff_days <= self.tier_two_max_days {
            diff_days * self.tier_two_rate
        } else {
            order.product_price.saturating_mul(self.forfeit_multiplier)
        };

        FineAssessment {
            amount,
            status: if amount > 0 {
                FineStatus::Unpaid
            } else {
                FineStatus::None
            },
        }
    }
}

/// Lenient `YYYY-MM-DD` parsing for the denormalized rental-date strings.
/// Anything unparseable means "no date", never an error.
fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
