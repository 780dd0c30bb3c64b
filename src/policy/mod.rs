//! Consistency policy resolution.
//!
//! - [`resolver`] - Pure decision functions over a cache configuration
//! - [`facts`] - All decisions bundled for memoization

pub mod facts;
pub mod resolver;

pub use facts::PolicyFacts;
pub use resolver::{
    default_entry_metadata, is_clustered, is_eligible_for_state_transfer, is_embedded_mode,
    is_exception_based_eviction, is_one_phase_commit, requires_segmentation,
    resolve_commit_protocol, supports_multi_version_concurrency, CommitProtocol,
};
