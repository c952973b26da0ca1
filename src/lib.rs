//! Storefront Promotions
//!
//! Promotion pricing and synchronization for the handmade-goods storefront.
//!
//! ## Features
//! - Active-window evaluation against wall-clock time
//! - Best-discount selection between a storewide percentage and order tiers
//! - Banner message templates (`%OFF%`, `%START_DATE%`, `%END_DATE%`, `%DAYS_LEFT%`)
//! - Durable local promotion slot, rehydrated at startup
//! - Last-writer-wins reconciliation against the authoritative remote copy

use thiserror::Error;

pub mod api;
pub mod clock;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod reconciler;
pub mod remote;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::aggregates::{ProgressiveDiscountRule, Promotion, PromotionState};
pub use domain::message::MessageRenderer;
pub use domain::pricing::{applicable_discount, apply_discount, clamp_percentage, is_active};
pub use domain::value_objects::Percentage;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use remote::RemoteSource;
pub use store::{LocalStore, MemoryLocalStore, PromotionStore};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum PromotionError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Corrupt promotion record: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Remote source error: {0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, PromotionError>;
