//! Cache manager.

use super::cache::{CacheRef, EmbeddedCache, SecureCache};
use super::listeners::{Listenable, Listener, ListenerId, ListenerRegistry, ListenerRemoval};
use super::registry::{ComponentRegistry, GlobalComponentRegistry};
use crate::core::config::{Configuration, GlobalConfiguration, ServerConfig};
use crate::core::error::{GridError, GridResult};
use crate::policy::is_clustered;
use crate::security::authz::{AuthorizationPermission, Authorizer};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle events fired by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    CacheStarted { name: String },
    CacheStopped { name: String },
}

/// Owns the caches of one node.
///
/// Administrative accessors check the thread's current subject. Protocol
/// handlers that need them without holding `ADMIN` go through the privilege
/// gate.
#[derive(Debug)]
pub struct CacheManager {
    configuration: Arc<GlobalConfiguration>,
    global_registry: Arc<GlobalComponentRegistry>,
    authorizer: Arc<Authorizer>,
    caches: RwLock<HashMap<String, Arc<EmbeddedCache>>>,
    listeners: ListenerRegistry<ManagerEvent>,
}

impl CacheManager {
    pub fn new(configuration: GlobalConfiguration) -> Self {
        let configuration = Arc::new(configuration);
        let authorizer = Arc::new(Authorizer::from_config(&configuration.security));

        tracing::info!(
            node = %configuration.node_name,
            clustered = is_clustered(&configuration),
            authorization = authorizer.is_enabled(),
            "cache manager created"
        );

        Self {
            global_registry: Arc::new(GlobalComponentRegistry::new(Arc::clone(&configuration))),
            configuration,
            authorizer,
            caches: RwLock::new(HashMap::new()),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Create a manager and start every cache defined in a server file.
    pub fn from_server_config(config: &ServerConfig) -> GridResult<Self> {
        let manager = Self::new(config.global.clone());
        for (name, cache) in &config.caches {
            manager.start_cache(name, cache.clone())?;
        }
        Ok(manager)
    }

    pub fn node_name(&self) -> &str {
        &self.configuration.node_name
    }

    /// Define and start a cache. Requires `ADMIN`.
    pub fn define_cache(&self, name: &str, configuration: Configuration) -> GridResult<()> {
        self.authorizer.check_current(AuthorizationPermission::Admin)?;
        self.start_cache(name, configuration)
    }

    fn start_cache(&self, name: &str, configuration: Configuration) -> GridResult<()> {
        let mode = configuration.clustering.cache_mode;
        if mode.is_clustered() && !is_clustered(&self.configuration) {
            return Err(GridError::InvalidConfiguration {
                message: format!("cache {} uses {} but the manager has no transport", name, mode),
            });
        }

        {
            let mut caches = self.caches.write();
            if caches
                .get(name)
                .is_some_and(|cache| cache.component_registry().is_running())
            {
                return Err(GridError::InvalidConfiguration {
                    message: format!("cache {} is already running", name),
                });
            }

            let registry = Arc::new(ComponentRegistry::new(
                name,
                Arc::new(configuration),
                &self.configuration,
            ));
            let policy = registry.policy();
            tracing::info!(
                cache = %name,
                mode = %mode,
                commit_protocol = %policy.commit_protocol,
                versioned = policy.multi_version_concurrency,
                segmented = policy.segmented,
                "cache started"
            );
            caches.insert(name.to_string(), Arc::new(EmbeddedCache::new(registry)));
        }

        self.listeners.notify(&ManagerEvent::CacheStarted {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Look up a running cache.
    ///
    /// With authorization enabled the result is a secure wrapper that checks
    /// the caller's subject on every operation.
    pub fn get_cache(&self, name: &str) -> GridResult<CacheRef> {
        let cache = self
            .caches
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| GridError::CacheNotFound {
                name: name.to_string(),
            })?;

        if !cache.component_registry().is_running() {
            return Err(GridError::CacheNotRunning {
                name: name.to_string(),
            });
        }

        if self.authorizer.is_enabled() {
            Ok(CacheRef::Secure(SecureCache::new(
                cache,
                Arc::clone(&self.authorizer),
            )))
        } else {
            Ok(CacheRef::Plain(cache))
        }
    }

    /// Stop a running cache. Requires `ADMIN`.
    pub fn stop_cache(&self, name: &str) -> GridResult<()> {
        self.authorizer.check_current(AuthorizationPermission::Admin)?;

        let cache = self
            .caches
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| GridError::CacheNotFound {
                name: name.to_string(),
            })?;

        cache.component_registry().stop();
        tracing::info!(cache = %name, "cache stopped");
        self.listeners.notify(&ManagerEvent::CacheStopped {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Names of running caches, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .caches
            .read()
            .iter()
            .filter(|(_, cache)| cache.component_registry().is_running())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Requires `ADMIN`.
    pub fn global_component_registry(&self) -> GridResult<Arc<GlobalComponentRegistry>> {
        self.authorizer.check_current(AuthorizationPermission::Admin)?;
        Ok(Arc::clone(&self.global_registry))
    }

    /// Requires `ADMIN`.
    pub fn configuration(&self) -> GridResult<Arc<GlobalConfiguration>> {
        self.authorizer.check_current(AuthorizationPermission::Admin)?;
        Ok(Arc::clone(&self.configuration))
    }

    /// Stop every cache and the global registry. Requires `ADMIN`.
    pub fn stop(&self) -> GridResult<()> {
        self.authorizer.check_current(AuthorizationPermission::Admin)?;
        for name in self.cache_names() {
            self.stop_cache(&name)?;
        }
        self.global_registry.stop();
        tracing::info!(node = %self.node_name(), "cache manager stopped");
        Ok(())
    }
}

impl Listenable for CacheManager {
    type Event = ManagerEvent;

    /// Requires `LISTEN`.
    fn add_listener(&self, listener: Arc<dyn Listener<ManagerEvent>>) -> GridResult<ListenerId> {
        self.authorizer.check_current(AuthorizationPermission::Listen)?;
        Ok(self.listeners.add(listener))
    }

    /// Requires `LISTEN`.
    fn remove_listener_async(&self, id: ListenerId) -> GridResult<ListenerRemoval> {
        self.authorizer.check_current(AuthorizationPermission::Listen)?;
        Ok(self.listeners.remove_async(id))
    }
}
