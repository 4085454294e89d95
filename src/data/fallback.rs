//! Static fallback coupon data
//!
//! This module provides the built-in last-resort coupon list served when the
//! remote source is unreachable and no cached snapshot exists. The list is
//! constructed with a wide validity window around the current time so the
//! fallback coupons are always available.

use chrono::{Duration, Utc};

use super::{Coupon, DiscountType};

/// Builds the default static fallback coupon list
///
/// Validity windows are anchored to the current time: each coupon became
/// valid 30 days ago and remains valid for a year, so the fallback tier
/// never serves a list that is entirely expired.
pub fn default_fallback_coupons() -> Vec<Coupon> {
    let now = Utc::now();
    let valid_from = now - Duration::days(30);
    let valid_to = now + Duration::days(365);

    vec![
        Coupon {
            id: "fallback-welcome10".to_string(),
            code: "WELCOME10".to_string(),
            title: "Welcome discount".to_string(),
            description: "10% off your first order".to_string(),
            discount: 10.0,
            discount_type: DiscountType::Percentage,
            valid_from,
            valid_to,
            is_active: true,
            min_amount: None,
        },
        Coupon {
            id: "fallback-save20".to_string(),
            code: "SAVE20".to_string(),
            title: "Save 20".to_string(),
            description: "20 off orders of 100 or more".to_string(),
            discount: 20.0,
            discount_type: DiscountType::Fixed,
            valid_from,
            valid_to,
            is_active: true,
            min_amount: Some(100.0),
        },
    ]
}

/// Finds a fallback coupon by its redemption code
///
/// # Arguments
///
/// * `code` - The redemption code to look up (case-sensitive)
///
/// # Returns
///
/// Returns `Some(Coupon)` if found, `None` otherwise
pub fn fallback_coupon_by_code(code: &str) -> Option<Coupon> {
    default_fallback_coupons()
        .into_iter()
        .find(|coupon| coupon.code == code)
}
