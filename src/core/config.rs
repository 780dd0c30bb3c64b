//! Cache and cluster configuration.
//!
//! Configuration is loaded from TOML files and validated once. After that it is
//! shared behind `Arc` and never mutated, so everything derived from it (see
//! [`crate::policy`]) is stable for the lifetime of a cache.

use crate::security::authz::AuthorizationPermission;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// ============================================================================
// Per-cache configuration
// ============================================================================

/// Replication topology and synchrony of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheMode {
    #[default]
    Local,
    ReplSync,
    ReplAsync,
    DistSync,
    DistAsync,
    ScatteredSync,
    ScatteredAsync,
    InvalidationSync,
    InvalidationAsync,
}

impl CacheMode {
    /// Check if writes wait for remote acknowledgement. Local caches count as synchronous.
    pub fn is_synchronous(&self) -> bool {
        matches!(
            self,
            Self::Local
                | Self::ReplSync
                | Self::DistSync
                | Self::ScatteredSync
                | Self::InvalidationSync
        )
    }

    /// Check if the cache spans more than one node.
    pub fn is_clustered(&self) -> bool {
        !matches!(self, Self::Local)
    }

    pub fn is_replicated(&self) -> bool {
        matches!(self, Self::ReplSync | Self::ReplAsync)
    }

    pub fn is_distributed(&self) -> bool {
        matches!(self, Self::DistSync | Self::DistAsync)
    }

    pub fn is_scattered(&self) -> bool {
        matches!(self, Self::ScatteredSync | Self::ScatteredAsync)
    }

    pub fn is_invalidation(&self) -> bool {
        matches!(self, Self::InvalidationSync | Self::InvalidationAsync)
    }
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Local => "LOCAL",
            Self::ReplSync => "REPL_SYNC",
            Self::ReplAsync => "REPL_ASYNC",
            Self::DistSync => "DIST_SYNC",
            Self::DistAsync => "DIST_ASYNC",
            Self::ScatteredSync => "SCATTERED_SYNC",
            Self::ScatteredAsync => "SCATTERED_ASYNC",
            Self::InvalidationSync => "INVALIDATION_SYNC",
            Self::InvalidationAsync => "INVALIDATION_ASYNC",
        };
        write!(f, "{}", name)
    }
}

/// Whether a cache participates in transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionMode {
    #[default]
    NonTransactional,
    Transactional,
}

impl TransactionMode {
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::Transactional)
    }
}

/// When transactional locks are acquired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockingMode {
    /// Locks are validated at commit time.
    #[default]
    Optimistic,
    /// Locks are acquired eagerly on first write.
    Pessimistic,
}

/// Read isolation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsolationLevel {
    ReadCommitted,
    #[default]
    RepeatableRead,
}

/// What happens when a bounded container is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvictionStrategy {
    /// No eviction.
    #[default]
    None,
    /// Eviction is triggered only by explicit calls.
    Manual,
    /// Entries are evicted to make room.
    Remove,
    /// Writes past capacity are rejected with an error.
    Exception,
}

impl EvictionStrategy {
    /// Check if capacity overflow rejects the write instead of evicting.
    pub fn is_exception_based(&self) -> bool {
        matches!(self, Self::Exception)
    }
}

/// Clustering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfiguration {
    #[serde(default)]
    pub cache_mode: CacheMode,

    /// Number of key-space segments for segmented caches.
    #[serde(default = "default_segments")]
    pub segments: u32,
}

impl Default for ClusteringConfiguration {
    fn default() -> Self {
        Self {
            cache_mode: CacheMode::default(),
            segments: default_segments(),
        }
    }
}

/// Transaction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionConfiguration {
    #[serde(default)]
    pub transaction_mode: TransactionMode,
    #[serde(default)]
    pub locking_mode: LockingMode,
}

/// Locking settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockingConfiguration {
    #[serde(default)]
    pub isolation_level: IsolationLevel,
}

/// Memory bounds. A size of 0 means unbounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfiguration {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub eviction_strategy: EvictionStrategy,
}

/// A persistent store attached to a cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfiguration {
    /// The store is shared by every node in the cluster.
    #[serde(default)]
    pub shared: bool,
    /// The store's contents are transferred when cluster membership changes.
    #[serde(default)]
    pub fetch_persistent_state: bool,
    /// The store addresses its data by segment.
    #[serde(default)]
    pub segmented: bool,
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistenceConfiguration {
    /// Attached stores, in chain order.
    #[serde(default)]
    pub stores: Vec<StoreConfiguration>,
}

impl PersistenceConfiguration {
    /// Check if any attached store uses segment-addressed storage.
    pub fn using_segmented_store(&self) -> bool {
        self.stores.iter().any(|store| store.segmented)
    }
}

/// Default expiration applied to entries written without metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpirationConfiguration {
    #[serde(default)]
    pub lifespan_ms: Option<u64>,
    #[serde(default)]
    pub max_idle_ms: Option<u64>,
}

/// Configuration of a single cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub clustering: ClusteringConfiguration,
    #[serde(default)]
    pub transaction: TransactionConfiguration,
    #[serde(default)]
    pub locking: LockingConfiguration,
    #[serde(default)]
    pub memory: MemoryConfiguration,
    #[serde(default)]
    pub persistence: PersistenceConfiguration,
    #[serde(default)]
    pub expiration: ExpirationConfiguration,
}

impl Configuration {
    /// Validate structural rules that depend on the cache itself and the global transport.
    pub fn validate(&self, name: &str, global: &GlobalConfiguration) -> Result<()> {
        let mode = self.clustering.cache_mode;
        let transactional = self.transaction.transaction_mode.is_transactional();

        if mode.is_clustered() && global.transport.is_none() {
            anyhow::bail!(
                "caches.{}: cache mode {} requires [global.transport]",
                name,
                mode
            );
        }

        if self.memory.eviction_strategy.is_exception_based() && !transactional {
            anyhow::bail!(
                "caches.{}: eviction_strategy EXCEPTION requires a transactional cache",
                name
            );
        }

        if mode.is_scattered() && transactional {
            anyhow::bail!("caches.{}: scattered caches cannot be transactional", name);
        }

        if self.clustering.segments == 0 {
            anyhow::bail!("caches.{}: clustering.segments must be > 0", name);
        }

        for (index, store) in self.persistence.stores.iter().enumerate() {
            if store.shared && store.fetch_persistent_state {
                tracing::warn!(
                    cache = %name,
                    store = index,
                    "shared store has fetch_persistent_state set; it will not take part in state transfer"
                );
            }
        }

        Ok(())
    }
}

fn default_segments() -> u32 {
    256
}

// ============================================================================
// Global configuration
// ============================================================================

/// Cluster transport. Its presence makes the manager clustered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfiguration {
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// Initial member addresses.
    #[serde(default)]
    pub initial_hosts: Vec<String>,
}

/// Manager-wide authorization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSecurityConfiguration {
    /// Enable subject-based authorization checks.
    #[serde(default)]
    pub authorization: bool,

    /// Role name to granted permissions.
    #[serde(default)]
    pub roles: BTreeMap<String, BTreeSet<AuthorizationPermission>>,
}

/// Internal settings used only by the server distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateGlobalConfiguration {
    /// The manager runs inside the protocol server rather than embedded in an application.
    #[serde(default)]
    pub server_mode: bool,
}

/// Module configurations keyed by module identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalModules {
    #[serde(default)]
    pub private: Option<PrivateGlobalConfiguration>,
}

/// A module whose configuration lives under `[global.modules]`.
pub trait ModuleConfiguration: Sized {
    /// Module identity, matching its table name.
    const MODULE_ID: &'static str;

    /// Select this module's configuration, if installed.
    fn lookup(modules: &GlobalModules) -> Option<&Self>;
}

impl ModuleConfiguration for PrivateGlobalConfiguration {
    const MODULE_ID: &'static str = "private";

    fn lookup(modules: &GlobalModules) -> Option<&Self> {
        modules.private.as_ref()
    }
}

/// Configuration of the cache manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfiguration {
    #[serde(default = "default_node_name")]
    pub node_name: String,

    #[serde(default)]
    pub transport: Option<TransportConfiguration>,

    #[serde(default)]
    pub security: GlobalSecurityConfiguration,

    #[serde(default)]
    pub modules: GlobalModules,
}

impl Default for GlobalConfiguration {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            transport: None,
            security: GlobalSecurityConfiguration::default(),
            modules: GlobalModules::default(),
        }
    }
}

impl GlobalConfiguration {
    /// Look up a module configuration. `None` means the module is not installed.
    pub fn module<M: ModuleConfiguration>(&self) -> Option<&M> {
        M::lookup(&self.modules)
    }
}

fn default_node_name() -> String {
    "node-local".to_string()
}

fn default_cluster_name() -> String {
    "gridcache".to_string()
}

// ============================================================================
// Server file
// ============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level server configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub global: GlobalConfiguration,

    /// Cache definitions by name.
    #[serde(default)]
    pub caches: BTreeMap<String, Configuration>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ServerConfig =
            toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }

        for (name, cache) in &self.caches {
            cache.validate(name, &self.global)?;
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
}
