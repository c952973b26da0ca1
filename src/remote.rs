//! Authoritative remote promotion source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::aggregates::{Promotion, PromotionState};
use crate::Result;

/// Read-only view of the promotion as another admin session last saved it.
///
/// `fetch` must be idempotent and side-effect free; the reconciler may call
/// it any number of times.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self) -> Result<Option<PromotionState>>;
}

/// Reads the promotion row from the storefront database. Never writes.
#[derive(Clone, Debug)]
pub struct PgRemoteSource {
    pool: PgPool,
    promotion_id: String,
}

impl PgRemoteSource {
    pub fn new(pool: PgPool, promotion_id: impl Into<String>) -> Self {
        Self { pool, promotion_id: promotion_id.into() }
    }
}

#[async_trait]
impl RemoteSource for PgRemoteSource {
    async fn fetch(&self) -> Result<Option<PromotionState>> {
        let row: Option<(Json<Promotion>, DateTime<Utc>)> =
            sqlx::query_as("SELECT config, updated_at FROM promotions WHERE id = $1")
                .bind(&self.promotion_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(promotion), updated_at)| PromotionState::new(promotion, updated_at)))
    }
}
