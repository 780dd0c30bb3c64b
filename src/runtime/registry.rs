//! Component registries and the distribution manager.
//!
//! These are the internal, security-sensitive handles. Without `ADMIN` they
//! are reached only through the protocol server's privilege gate.

use crate::core::config::{Configuration, GlobalConfiguration};
use crate::policy::PolicyFacts;
use parking_lot::RwLock;
use std::sync::Arc;

/// Lifecycle status of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentStatus {
    Running,
    Terminated,
}

/// Key-space layout of a clustered cache on this node.
///
/// Segment ownership itself is computed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionManager {
    local_node: String,
    segments: u32,
}

impl DistributionManager {
    /// Create the distribution manager for a clustered cache.
    ///
    /// Caches that do not require segmentation route the whole key space as a
    /// single segment.
    pub fn new(local_node: impl Into<String>, cfg: &Configuration, policy: &PolicyFacts) -> Self {
        let segments = if policy.segmented {
            cfg.clustering.segments
        } else {
            1
        };

        Self {
            local_node: local_node.into(),
            segments,
        }
    }

    pub fn local_node(&self) -> &str {
        &self.local_node
    }

    pub fn segment_count(&self) -> u32 {
        self.segments
    }

    pub fn is_segmented(&self) -> bool {
        self.segments > 1
    }
}

/// Per-cache component registry.
#[derive(Debug)]
pub struct ComponentRegistry {
    cache_name: String,
    configuration: Arc<Configuration>,
    policy: PolicyFacts,
    distribution: Option<Arc<DistributionManager>>,
    status: RwLock<ComponentStatus>,
}

impl ComponentRegistry {
    /// Build the registry for a starting cache. Policy facts are resolved here, once.
    pub fn new(
        cache_name: impl Into<String>,
        configuration: Arc<Configuration>,
        global: &GlobalConfiguration,
    ) -> Self {
        let policy = PolicyFacts::resolve(&configuration);
        let distribution = configuration
            .clustering
            .cache_mode
            .is_clustered()
            .then(|| Arc::new(DistributionManager::new(&global.node_name, &configuration, &policy)));

        Self {
            cache_name: cache_name.into(),
            configuration,
            policy,
            distribution,
            status: RwLock::new(ComponentStatus::Running),
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn configuration(&self) -> Arc<Configuration> {
        Arc::clone(&self.configuration)
    }

    /// Policy facts resolved when the cache started.
    pub fn policy(&self) -> &PolicyFacts {
        &self.policy
    }

    /// Distribution manager; `None` for local caches.
    pub fn distribution_manager(&self) -> Option<Arc<DistributionManager>> {
        self.distribution.clone()
    }

    pub fn status(&self) -> ComponentStatus {
        *self.status.read()
    }

    pub fn is_running(&self) -> bool {
        self.status() == ComponentStatus::Running
    }

    pub(crate) fn stop(&self) {
        *self.status.write() = ComponentStatus::Terminated;
    }
}

/// Manager-wide component registry.
#[derive(Debug)]
pub struct GlobalComponentRegistry {
    configuration: Arc<GlobalConfiguration>,
    status: RwLock<ComponentStatus>,
}

impl GlobalComponentRegistry {
    pub fn new(configuration: Arc<GlobalConfiguration>) -> Self {
        Self {
            configuration,
            status: RwLock::new(ComponentStatus::Running),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.configuration.node_name
    }

    pub fn configuration(&self) -> Arc<GlobalConfiguration> {
        Arc::clone(&self.configuration)
    }

    pub fn status(&self) -> ComponentStatus {
        *self.status.read()
    }

    pub fn is_running(&self) -> bool {
        self.status() == ComponentStatus::Running
    }

    pub(crate) fn stop(&self) {
        *self.status.write() = ComponentStatus::Terminated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CacheMode, TransactionMode, TransportConfiguration};

    fn clustered_global() -> GlobalConfiguration {
        GlobalConfiguration {
            node_name: "node-a".to_string(),
            transport: Some(TransportConfiguration::default()),
            ..Default::default()
        }
    }

    #[test]
    fn test_local_cache_has_no_distribution() {
        let registry = ComponentRegistry::new(
            "local",
            Arc::new(Configuration::default()),
            &GlobalConfiguration::default(),
        );
        assert!(registry.distribution_manager().is_none());
        assert!(registry.is_running());

        registry.stop();
        assert_eq!(registry.status(), ComponentStatus::Terminated);
    }

    #[test]
    fn test_segment_count_follows_policy() {
        let mut cfg = Configuration::default();
        cfg.clustering.cache_mode = CacheMode::DistSync;
        cfg.clustering.segments = 64;
        let registry = ComponentRegistry::new("dist", Arc::new(cfg), &clustered_global());
        let dm = registry.distribution_manager().unwrap();
        assert_eq!(dm.segment_count(), 64);
        assert_eq!(dm.local_node(), "node-a");

        // Non-transactional invalidation needs no segments.
        let mut cfg = Configuration::default();
        cfg.clustering.cache_mode = CacheMode::InvalidationSync;
        let registry = ComponentRegistry::new("inv", Arc::new(cfg.clone()), &clustered_global());
        assert!(!registry.distribution_manager().unwrap().is_segmented());

        cfg.transaction.transaction_mode = TransactionMode::Transactional;
        let registry = ComponentRegistry::new("inv-tx", Arc::new(cfg), &clustered_global());
        assert_eq!(registry.distribution_manager().unwrap().segment_count(), 256);
    }
}
