//! Promotion state store.
//!
//! Owns the current [`PromotionState`] and mirrors every change into a
//! durable [`LocalStore`] slot. All operations are synchronous and local.
//! Storage failures stop here: they are logged and the in-memory state stays
//! authoritative for the rest of the process.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::domain::aggregates::{Promotion, PromotionState};
use crate::domain::events::PromotionEvent;
use crate::domain::freshness::{self, MergeDecision};
use crate::{PromotionError, Result};

/// Durable single-slot storage for the promotion, scoped to this device.
pub trait LocalStore: Send + Sync {
    /// `Ok(None)` when nothing was ever saved; `Err` when the record is unreadable.
    fn load(&self) -> Result<Option<PromotionState>>;
    fn save(&self, state: &PromotionState) -> Result<()>;
    fn delete(&self) -> Result<()>;
}

/// In-process slot holding the serialized record, as a durable store would.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    slot: Mutex<Option<String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_raw(raw: impl Into<String>) -> Self { Self { slot: Mutex::new(Some(raw.into())) } }

    pub fn with_state(state: &PromotionState) -> Result<Self> { Ok(Self::with_raw(serde_json::to_string(state)?)) }

    pub fn raw(&self) -> Option<String> { self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone() }
}

impl LocalStore for MemoryLocalStore {
    fn load(&self) -> Result<Option<PromotionState>> {
        self.raw()
            .map(|raw| serde_json::from_str(&raw).map_err(|e| PromotionError::Corrupt(e.to_string())))
            .transpose()
    }

    fn save(&self, state: &PromotionState) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(raw);
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }
}

#[derive(Default)]
struct Inner {
    current: Option<PromotionState>,
    events: Vec<PromotionEvent>,
}

pub struct PromotionStore {
    inner: Mutex<Inner>,
    local: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
}

impl PromotionStore {
    /// Rehydrates from `local`. An unreadable record is treated as absent.
    pub fn open(local: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        let current = match local.load() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable promotion record");
                None
            }
        };
        if let Some(state) = &current {
            tracing::info!(enabled = state.promotion.enabled, updated_at = %state.updated_at, "promotion rehydrated");
        }
        Self { inner: Mutex::new(Inner { current, events: vec![] }), local, clock }
    }

    pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

    pub fn read(&self) -> Option<PromotionState> { self.lock().current.clone() }

    /// Replaces the promotion and stamps it with the current time.
    ///
    /// The stamp is read under the lock, so commit order and `updated_at`
    /// order agree.
    pub fn set(&self, promotion: Promotion) -> PromotionState {
        let mut inner = self.lock();
        let state = PromotionState::new(promotion, self.clock.now());
        self.persist(&state);
        inner.current = Some(state.clone());
        inner.events.push(PromotionEvent::saved(&state));
        tracing::info!(enabled = state.promotion.enabled, updated_at = %state.updated_at, "promotion saved");
        state
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        if let Err(e) = self.local.delete() {
            tracing::warn!(error = %e, "failed to delete stored promotion");
        }
        inner.current = None;
        inner.events.push(PromotionEvent::cleared(self.clock.now()));
        tracing::info!("promotion cleared");
    }

    /// Applies the freshness policy to a fetched remote state.
    ///
    /// The decision and the write happen under one lock, so a concurrent `set`
    /// lands either entirely before or entirely after the merge. An adopted
    /// state is re-stamped with local time; the remote timestamp only takes
    /// part in the comparison.
    pub fn merge_remote(&self, remote: &PromotionState) -> (MergeDecision, Option<PromotionState>) {
        let mut inner = self.lock();
        let now = self.clock.now();
        let decision = freshness::decide(inner.current.as_ref(), remote, now);
        if decision != MergeDecision::Adopt {
            return (decision, None);
        }
        let adopted = PromotionState::new(remote.promotion.clone(), now);
        self.persist(&adopted);
        inner.current = Some(adopted.clone());
        inner.events.push(PromotionEvent::reconciled(remote, &adopted));
        (decision, Some(adopted))
    }

    pub fn take_events(&self) -> Vec<PromotionEvent> { std::mem::take(&mut self.lock().events) }

    fn persist(&self, state: &PromotionState) {
        if let Err(e) = self.local.save(state) {
            tracing::error!(error = %e, "failed to persist promotion; keeping in-memory state");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> { self.inner.lock().unwrap_or_else(|e| e.into_inner()) }
}
