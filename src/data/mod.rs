//! Core data models for the coupon cache
//!
//! This module contains the data types used throughout the crate for
//! representing coupons, discount rules, and the state exposed to callers.

pub mod fallback;

pub use fallback::default_fallback_coupons;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discount offer with a redemption code and a validity window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Unique identifier for the coupon
    pub id: String,
    /// Human-entered redemption code
    pub code: String,
    /// Short display title
    #[serde(default)]
    pub title: String,
    /// Longer display text
    #[serde(default)]
    pub description: String,
    /// Discount magnitude; always positive for validated coupons
    pub discount: f64,
    /// Whether the discount is a percentage of the amount or a fixed value
    pub discount_type: DiscountType,
    /// Start of the validity window (inclusive)
    pub valid_from: DateTime<Utc>,
    /// End of the validity window (inclusive)
    pub valid_to: DateTime<Utc>,
    /// Inactive coupons are never applicable regardless of the date window
    pub is_active: bool,
    /// Minimum order amount required for the coupon to apply, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
}

/// How a coupon's discount magnitude is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount` is a percentage of the order amount
    Percentage,
    /// `discount` is a fixed value, capped at the order amount
    Fixed,
}

impl Coupon {
    /// Returns true if the coupon is active and `now` falls inside its
    /// validity window (inclusive on both ends).
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.valid_from && now <= self.valid_to
    }

    /// Returns true if the coupon is available and the order amount meets
    /// its minimum-amount constraint (if one is set).
    pub fn is_applicable(&self, amount: f64, now: DateTime<Utc>) -> bool {
        if !self.is_available(now) {
            return false;
        }
        match self.min_amount {
            Some(min) => amount >= min,
            None => true,
        }
    }

    /// Computes the discount this coupon grants on `amount` at time `now`.
    ///
    /// Returns `0.0` when the coupon is not applicable. The result is always
    /// within `[0, amount]`: percentage discounts over 100% and fixed
    /// discounts larger than the amount are capped at the amount itself.
    pub fn discount_for(&self, amount: f64, now: DateTime<Utc>) -> f64 {
        if !self.is_applicable(amount, now) {
            return 0.0;
        }

        let raw = match self.discount_type {
            DiscountType::Percentage => amount * self.discount / 100.0,
            DiscountType::Fixed => self.discount.min(amount),
        };

        raw.clamp(0.0, amount)
    }
}

/// Snapshot of the cache's externally visible state
///
/// Returned as an owned copy from every load operation and from
/// `CouponCache::state`, so callers never observe a half-updated value.
/// When `fallback_mode` is set, `error` describes why live data was
/// unavailable; the coupon list itself is never absent (it may be empty
/// or the static fallback list).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerState {
    /// The current coupon list (live, cached, or static fallback)
    pub coupons: Vec<Coupon>,
    /// True only while a load is in flight
    pub is_loading: bool,
    /// Human-readable description of the most recent failure, if any
    pub error: Option<String>,
    /// True when the coupons were not confirmed fresh from the live source
    pub fallback_mode: bool,
    /// Number of source attempts consumed by the most recent load
    pub retry_count: u32,
}
