//! Payload validation and normalization
//!
//! The remote source returns loosely typed records; this module classifies
//! each one as `Valid(Coupon)` or `Rejected(reason)` and collects the
//! results into a report. Invalid records are dropped, never propagated as
//! errors, so one malformed entry cannot poison a whole load.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::data::{Coupon, DiscountType};

/// Outcome of validating a single raw record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The record parsed into a well-formed coupon
    Valid(Coupon),
    /// The record was dropped for the given reason
    Rejected(RejectReason),
}

/// Why a raw record was dropped during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The element was not a JSON object
    NotAnObject,
    /// `id` was missing or empty
    MissingId,
    /// `code` was missing or empty
    MissingCode,
    /// `discount` was missing, non-numeric, or not positive
    InvalidDiscount,
    /// `discountType` was not `percentage` or `fixed`
    InvalidDiscountType,
    /// A date field was missing or could not be coerced to a timestamp
    InvalidDates,
}

/// Result of validating a whole payload
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Valid coupons in their original relative order
    pub coupons: Vec<Coupon>,
    /// Reasons for every dropped record, in order of appearance
    pub rejected: Vec<RejectReason>,
}

impl ValidationReport {
    /// Total number of records examined
    pub fn total(&self) -> usize {
        self.coupons.len() + self.rejected.len()
    }
}

/// Validates a raw payload into a report
///
/// A non-array payload validates to zero coupons rather than an error: the
/// source answered, it just had nothing usable to say.
pub fn validate_payload(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(records) = value.as_array() else {
        return report;
    };

    for record in records {
        match validate_record(record) {
            RecordOutcome::Valid(coupon) => report.coupons.push(coupon),
            RecordOutcome::Rejected(reason) => report.rejected.push(reason),
        }
    }

    report
}

/// Validates one raw record
pub fn validate_record(value: &Value) -> RecordOutcome {
    let Some(record) = value.as_object() else {
        return RecordOutcome::Rejected(RejectReason::NotAnObject);
    };

    let Some(id) = non_empty_string(record.get("id")) else {
        return RecordOutcome::Rejected(RejectReason::MissingId);
    };
    let Some(code) = non_empty_string(record.get("code")) else {
        return RecordOutcome::Rejected(RejectReason::MissingCode);
    };

    let discount = record.get("discount").and_then(Value::as_f64);
    let Some(discount) = discount.filter(|d| d.is_finite() && *d > 0.0) else {
        return RecordOutcome::Rejected(RejectReason::InvalidDiscount);
    };

    let discount_type = match record.get("discountType").and_then(Value::as_str) {
        Some("percentage") => DiscountType::Percentage,
        Some("fixed") => DiscountType::Fixed,
        _ => return RecordOutcome::Rejected(RejectReason::InvalidDiscountType),
    };

    let (Some(valid_from), Some(valid_to)) = (
        coerce_timestamp(record.get("validFrom")),
        coerce_timestamp(record.get("validTo")),
    ) else {
        return RecordOutcome::Rejected(RejectReason::InvalidDates);
    };

    let coupon = Coupon {
        id,
        code,
        title: string_or_empty(record.get("title")),
        description: string_or_empty(record.get("description")),
        discount,
        discount_type,
        valid_from,
        valid_to,
        is_active: record
            .get("isActive")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        min_amount: record
            .get("minAmount")
            .and_then(Value::as_f64)
            .filter(|m| m.is_finite()),
    };

    RecordOutcome::Valid(coupon)
}

/// Extracts a non-empty string field
fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extracts a string field, defaulting to empty
fn string_or_empty(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Coerces a raw date field into a canonical UTC timestamp
///
/// Accepts RFC 3339 strings and epoch-millisecond numbers, the two shapes
/// the backend has been observed to emit.
fn coerce_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}
