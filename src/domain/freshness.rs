//! Merge policy between the local promotion and the authoritative remote copy.
//!
//! Last writer wins, ordered by `updated_at`, with one guard: a remote
//! promotion that is not active right now never replaces local state. This is
//! correct for a single admin editing from several devices. It does not detect
//! conflicts between concurrent admins.

use chrono::{DateTime, Utc};

use crate::domain::aggregates::PromotionState;
use crate::domain::pricing::is_active;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeDecision {
    Adopt,
    RemoteInactive,
    LocalNewer { local_updated_at: DateTime<Utc>, remote_updated_at: DateTime<Utc> },
}

/// Decides whether `remote` replaces `local`. A missing local state is older
/// than anything; equal timestamps go to the remote.
pub fn decide(local: Option<&PromotionState>, remote: &PromotionState, now: DateTime<Utc>) -> MergeDecision {
    if !is_active(Some(&remote.promotion), now) {
        return MergeDecision::RemoteInactive;
    }
    match local {
        Some(local) if remote.updated_at < local.updated_at => MergeDecision::LocalNewer {
            local_updated_at: local.updated_at,
            remote_updated_at: remote.updated_at,
        },
        _ => MergeDecision::Adopt,
    }
}
