//! Domain events
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::PromotionState;

pub const SUBJECT: &str = "promotions.events";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionEvent {
    Saved { event_id: Uuid, enabled: bool, updated_at: DateTime<Utc> },
    Cleared { event_id: Uuid, cleared_at: DateTime<Utc> },
    Reconciled { event_id: Uuid, remote_updated_at: DateTime<Utc>, updated_at: DateTime<Utc> },
}

impl PromotionEvent {
    pub fn saved(state: &PromotionState) -> Self {
        Self::Saved { event_id: Uuid::now_v7(), enabled: state.promotion.enabled, updated_at: state.updated_at }
    }

    pub fn cleared(at: DateTime<Utc>) -> Self { Self::Cleared { event_id: Uuid::now_v7(), cleared_at: at } }

    pub fn reconciled(remote: &PromotionState, adopted: &PromotionState) -> Self {
        Self::Reconciled { event_id: Uuid::now_v7(), remote_updated_at: remote.updated_at, updated_at: adopted.updated_at }
    }
}
