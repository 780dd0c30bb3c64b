//! Consistency decisions derived from cache configuration.
//!
//! Every function here is pure and total over a validated configuration.
//! Results never change for a given configuration instance, so callers may
//! memoize them (see [`super::facts::PolicyFacts`]).

use crate::core::config::{
    Configuration, GlobalConfiguration, IsolationLevel, LockingMode, PrivateGlobalConfiguration,
    StoreConfiguration,
};
use crate::core::metadata::Metadata;
use serde::{Deserialize, Serialize};

/// Number of cluster-wide coordination rounds a transaction needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitProtocol {
    OnePhase,
    TwoPhase,
}

impl std::fmt::Display for CommitProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnePhase => write!(f, "ONE_PHASE"),
            Self::TwoPhase => write!(f, "TWO_PHASE"),
        }
    }
}

/// Check if writes past capacity are rejected rather than evicting other entries.
pub fn is_exception_based_eviction(cfg: &Configuration) -> bool {
    cfg.memory.size > 0 && cfg.memory.eviction_strategy.is_exception_based()
}

/// Resolve the commit protocol. Guard order is significant.
pub fn resolve_commit_protocol(cfg: &Configuration) -> CommitProtocol {
    // A rejected write cannot be undone after a one-phase apply on a remote owner.
    if is_exception_based_eviction(cfg) {
        return CommitProtocol::TwoPhase;
    }
    // No reliable rendezvous for a second round.
    if !cfg.clustering.cache_mode.is_synchronous() {
        return CommitProtocol::OnePhase;
    }
    // Locks were taken before commit.
    if cfg.transaction.locking_mode == LockingMode::Pessimistic {
        return CommitProtocol::OnePhase;
    }
    CommitProtocol::TwoPhase
}

pub fn is_one_phase_commit(cfg: &Configuration) -> bool {
    resolve_commit_protocol(cfg) == CommitProtocol::OnePhase
}

/// Check if entries carry version stamps for cross-replica write-skew detection.
pub fn supports_multi_version_concurrency(cfg: &Configuration) -> bool {
    cfg.transaction.transaction_mode.is_transactional()
        && cfg.transaction.locking_mode == LockingMode::Optimistic
        && cfg.locking.isolation_level == IsolationLevel::RepeatableRead
        // invalidation ships invalidations, not values
        && !cfg.clustering.cache_mode.is_invalidation()
}

/// Check if the key space must be partitioned into segments.
pub fn requires_segmentation(cfg: &Configuration) -> bool {
    let mode = cfg.clustering.cache_mode;
    let transactional = cfg.transaction.transaction_mode.is_transactional();

    mode.is_replicated()
        || mode.is_distributed()
        || mode.is_scattered()
        || (mode.is_invalidation() && transactional)
        || cfg.persistence.using_segmented_store()
}

/// Check if a store's contents move with state transfer.
///
/// Shared stores already hold the cluster-wide data.
pub fn is_eligible_for_state_transfer(store: &StoreConfiguration) -> bool {
    !store.shared && store.fetch_persistent_state
}

/// Metadata applied to entries written without caller-supplied metadata.
pub fn default_entry_metadata(cfg: &Configuration) -> Metadata {
    Metadata::from_millis(cfg.expiration.lifespan_ms, cfg.expiration.max_idle_ms)
}

/// Check if the manager runs embedded in an application.
///
/// An absent private module means embedded.
pub fn is_embedded_mode(global: &GlobalConfiguration) -> bool {
    global
        .module::<PrivateGlobalConfiguration>()
        .map_or(true, |private| !private.server_mode)
}

pub fn is_clustered(global: &GlobalConfiguration) -> bool {
    global.transport.is_some()
}
