//! Discount rule evaluation.
//!
//! Everything here is pure and total: malformed configuration (NaN
//! percentages, negative thresholds, inverted windows) never produces an
//! error, it produces the smallest discount.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::aggregates::Promotion;
use crate::domain::value_objects::{round_cents, Percentage};

pub fn clamp_percentage(raw: f64) -> Percentage { Percentage::clamped(raw) }

/// Whether `promotion` applies at `now`.
///
/// Both window bounds are inclusive and tested independently, so an inverted
/// window (`start_at > end_at`) is simply never active.
pub fn is_active(promotion: Option<&Promotion>, now: DateTime<Utc>) -> bool {
    let Some(promotion) = promotion else { return false };
    if !promotion.enabled { return false; }
    if promotion.start_at.is_some_and(|start| now < start) { return false; }
    if promotion.end_at.is_some_and(|end| now > end) { return false; }
    true
}

/// Best single discount for an order of `order_total`.
///
/// The flat storewide percentage and the best qualifying tier are computed
/// independently and the larger one wins; they never stack.
pub fn applicable_discount(promotion: Option<&Promotion>, order_total: Decimal, now: DateTime<Utc>) -> Percentage {
    match promotion {
        Some(p) if is_active(Some(p), now) => global_candidate(p).max(progressive_candidate(p, order_total)),
        _ => Percentage::ZERO,
    }
}

fn global_candidate(promotion: &Promotion) -> Percentage {
    promotion.global_percentage.filter(|p| *p > 0.0).map(clamp_percentage).unwrap_or(Percentage::ZERO)
}

/// Tier with the largest threshold not above `order_total`. Tiers sharing that
/// threshold resolve to the higher percentage. Negative thresholds never qualify.
fn progressive_candidate(promotion: &Promotion, order_total: Decimal) -> Percentage {
    promotion
        .progressive_rules
        .iter()
        .filter(|rule| !rule.threshold.is_sign_negative() && rule.threshold <= order_total)
        .map(|rule| (rule.threshold, clamp_percentage(rule.percentage)))
        .max()
        .map(|(_, pct)| pct)
        .unwrap_or(Percentage::ZERO)
}

/// `price` reduced by `percentage`, rounded half-up to cents.
///
/// A zero discount returns `price` untouched, including any sub-cent digits.
pub fn apply_discount(price: Decimal, percentage: Percentage) -> Decimal {
    if percentage.is_zero() { return price; }
    round_cents(price * percentage.remaining_fraction())
}

/// Price a shopper pays for `price` when the order totals `order_total`.
pub fn discounted_price(promotion: Option<&Promotion>, price: Decimal, order_total: Decimal, now: DateTime<Utc>) -> Decimal {
    apply_discount(price, applicable_discount(promotion, order_total, now))
}
