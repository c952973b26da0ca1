//! Promotion Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// "Order total at or above `threshold` earns `percentage` off."
///
/// Tiers are independent; at most one applies to an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressiveDiscountRule {
    pub threshold: Decimal,
    pub percentage: f64,
}

impl ProgressiveDiscountRule {
    pub fn new(threshold: Decimal, percentage: f64) -> Self { Self { threshold, percentage } }
}

/// Storewide promotion configuration as produced by the admin editor.
///
/// Percentages are kept exactly as entered; every consumer goes through the
/// pricing functions, which clamp them. Fields the engine does not interpret
/// (banner colors, layout flags) land in `presentation` and are written back
/// untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progressive_rules: Vec<ProgressiveDiscountRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
    #[serde(flatten)]
    pub presentation: Map<String, Value>,
}

impl Promotion {
    pub fn storewide(percentage: f64) -> Self {
        Self { enabled: true, global_percentage: Some(percentage), ..Self::default() }
    }

    pub fn with_rules(mut self, rules: Vec<ProgressiveDiscountRule>) -> Self { self.progressive_rules = rules; self }

    pub fn with_window(mut self, start_at: Option<DateTime<Utc>>, end_at: Option<DateTime<Utc>>) -> Self {
        self.start_at = start_at;
        self.end_at = end_at;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self { self.message_template = Some(template.into()); self }
}

/// A promotion together with the moment it was last written on this device.
///
/// `updated_at` is the only field reconciliation orders by. It is stamped by
/// the store, never by display code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionState {
    pub promotion: Promotion,
    pub updated_at: DateTime<Utc>,
}

impl PromotionState {
    pub fn new(promotion: Promotion, updated_at: DateTime<Utc>) -> Self { Self { promotion, updated_at } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presentation_hints_round_trip() {
        let raw = json!({
            "enabled": true,
            "globalPercentage": 10.0,
            "bannerColor": "#ffcc00",
            "layout": { "compact": true }
        });
        let promo: Promotion = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(promo.global_percentage, Some(10.0));
        assert_eq!(promo.presentation.get("bannerColor"), Some(&json!("#ffcc00")));
        assert_eq!(serde_json::to_value(&promo).unwrap(), raw);
    }

    #[test]
    fn test_thresholds_accept_numbers() {
        let promo: Promotion = serde_json::from_value(json!({
            "enabled": true,
            "progressiveRules": [{ "threshold": 100, "percentage": 5 }, { "threshold": "250.50", "percentage": 20 }]
        })).unwrap();
        assert_eq!(promo.progressive_rules[0].threshold, Decimal::new(100, 0));
        assert_eq!(promo.progressive_rules[1].threshold, Decimal::new(25050, 2));
    }

    #[test]
    fn test_missing_fields_default_to_disabled() {
        let promo: Promotion = serde_json::from_str("{}").unwrap();
        assert!(!promo.enabled);
        assert!(promo.progressive_rules.is_empty());
    }
}
