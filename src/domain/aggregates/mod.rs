//! Aggregates module
pub mod promotion;

pub use promotion::{ProgressiveDiscountRule, Promotion, PromotionState};
