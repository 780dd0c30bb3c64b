//! Bundled policy facts for one cache configuration.

use super::resolver::{
    default_entry_metadata, is_eligible_for_state_transfer, is_exception_based_eviction,
    requires_segmentation, resolve_commit_protocol, supports_multi_version_concurrency,
    CommitProtocol,
};
use crate::core::config::Configuration;
use crate::core::metadata::Metadata;
use serde::Serialize;

/// Every policy decision for a configuration, resolved at once.
///
/// Facts are never persisted. Because a [`Configuration`] is immutable once a
/// cache starts, a resolved value stays valid for the cache's lifetime and can be
/// held next to the configuration without locking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyFacts {
    pub commit_protocol: CommitProtocol,
    pub multi_version_concurrency: bool,
    pub segmented: bool,
    pub exception_based_eviction: bool,
    /// Indices into `persistence.stores` of stores that take part in state transfer.
    pub state_transfer_stores: Vec<usize>,
    pub default_metadata: Metadata,
}

impl PolicyFacts {
    /// Resolve all facts for a configuration.
    pub fn resolve(cfg: &Configuration) -> Self {
        let state_transfer_stores = cfg
            .persistence
            .stores
            .iter()
            .enumerate()
            .filter(|(_, store)| is_eligible_for_state_transfer(store))
            .map(|(index, _)| index)
            .collect();

        Self {
            commit_protocol: resolve_commit_protocol(cfg),
            multi_version_concurrency: supports_multi_version_concurrency(cfg),
            segmented: requires_segmentation(cfg),
            exception_based_eviction: is_exception_based_eviction(cfg),
            state_transfer_stores,
            default_metadata: default_entry_metadata(cfg),
        }
    }

    pub fn is_one_phase_commit(&self) -> bool {
        self.commit_protocol == CommitProtocol::OnePhase
    }

    /// Check if any attached store takes part in state transfer.
    pub fn has_state_transfer_store(&self) -> bool {
        !self.state_transfer_stores.is_empty()
    }
}
