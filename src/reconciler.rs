//! Remote reconciliation.
//!
//! Pulls the authoritative promotion and merges it into the local store with
//! the policy in [`crate::domain::freshness`]. Fetch failures never reach the
//! caller as errors: the local state stays in charge and the outcome says why
//! nothing changed.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::domain::aggregates::PromotionState;
use crate::domain::freshness::MergeDecision;
use crate::remote::RemoteSource;
use crate::store::PromotionStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Adopted { state: PromotionState },
    RemoteAbsent,
    RemoteInactive,
    LocalNewer,
    FetchFailed { error: String },
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<PromotionStore>,
    remote: Arc<dyn RemoteSource>,
}

impl Reconciler {
    pub fn new(store: Arc<PromotionStore>, remote: Arc<dyn RemoteSource>) -> Self { Self { store, remote } }

    /// Fetches once and merges against whatever the store holds when the
    /// fetch completes. A `set` that lands while the fetch is in flight can be
    /// overwritten by a remote state with a newer timestamp.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        let remote = match self.remote.fetch().await {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                tracing::debug!("no remote promotion");
                return ReconcileOutcome::RemoteAbsent;
            }
            Err(e) => {
                tracing::warn!(error = %e, "promotion fetch failed; keeping local state");
                return ReconcileOutcome::FetchFailed { error: e.to_string() };
            }
        };

        match self.store.merge_remote(&remote) {
            (MergeDecision::Adopt, Some(state)) => {
                tracing::info!(remote_updated_at = %remote.updated_at, updated_at = %state.updated_at, "adopted remote promotion");
                ReconcileOutcome::Adopted { state }
            }
            (MergeDecision::RemoteInactive, _) => {
                tracing::debug!(remote_updated_at = %remote.updated_at, "remote promotion inactive; ignored");
                ReconcileOutcome::RemoteInactive
            }
            (decision, _) => {
                tracing::debug!(?decision, "local promotion is newer");
                ReconcileOutcome::LocalNewer
            }
        }
    }

    /// Runs [`Reconciler::reconcile`] in the background.
    pub fn spawn(&self) -> JoinHandle<ReconcileOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.reconcile().await })
    }
}
