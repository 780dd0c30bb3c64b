//! Privilege gate for protocol handlers.
//!
//! Each operation builds exactly one action from [`super::actions`], acquires
//! elevation for the server code domain, runs the action and drops the
//! elevation before returning. Errors raised by the action come back
//! unchanged. If elevation is refused the action never runs.

use super::actions::{
    AddCacheManagerListener, AnonymizeCache, GetCache, GetCacheComponentRegistry,
    GetCacheConfiguration, GetCacheManagerConfiguration, GetDistributionManager,
    GetGlobalComponentRegistry, PrivilegedAction, RemoveListenerAsync, UnwrapCache,
};
use super::enforcement::{process_enforcement, Enforcement, SERVER_CODE_DOMAIN};
use crate::core::config::{Configuration, GlobalConfiguration};
use crate::core::error::GridResult;
use crate::runtime::cache::CacheRef;
use crate::runtime::listeners::{Listenable, Listener, ListenerId, ListenerRemoval};
use crate::runtime::manager::{CacheManager, ManagerEvent};
use crate::runtime::registry::{ComponentRegistry, DistributionManager, GlobalComponentRegistry};
use std::sync::Arc;

/// Runs the fixed catalogue of privileged operations.
///
/// Crate-private: every gate elevates as [`SERVER_CODE_DOMAIN`], so only the
/// protocol server may hold one.
#[derive(Debug, Clone)]
pub(crate) struct PrivilegeGate {
    enforcement: Arc<Enforcement>,
}

impl PrivilegeGate {
    /// Create a gate bound to the process enforcement mode.
    pub(crate) fn new() -> Self {
        Self {
            enforcement: process_enforcement(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_enforcement(enforcement: Enforcement) -> Self {
        Self {
            enforcement: Arc::new(enforcement),
        }
    }

    fn do_privileged<A: PrivilegedAction>(&self, action: A) -> GridResult<A::Output> {
        let _scope = self.enforcement.elevate(SERVER_CODE_DOMAIN)?;
        tracing::trace!(action = %A::KIND, "running privileged action");
        action.run()
    }

    pub(crate) fn component_registry(&self, cache: &CacheRef) -> GridResult<Arc<ComponentRegistry>> {
        self.do_privileged(GetCacheComponentRegistry { cache })
    }

    pub(crate) fn cache_configuration(&self, cache: &CacheRef) -> GridResult<Arc<Configuration>> {
        self.do_privileged(GetCacheConfiguration { cache })
    }

    /// `None` for local caches.
    pub(crate) fn distribution_manager(
        &self,
        cache: &CacheRef,
    ) -> GridResult<Option<Arc<DistributionManager>>> {
        self.do_privileged(GetDistributionManager { cache })
    }

    pub(crate) fn cache_by_name(&self, manager: &CacheManager, name: &str) -> GridResult<CacheRef> {
        self.do_privileged(GetCache { manager, name })
    }

    pub(crate) fn global_component_registry(
        &self,
        manager: &CacheManager,
    ) -> GridResult<Arc<GlobalComponentRegistry>> {
        self.do_privileged(GetGlobalComponentRegistry { manager })
    }

    pub(crate) fn manager_configuration(
        &self,
        manager: &CacheManager,
    ) -> GridResult<Arc<GlobalConfiguration>> {
        self.do_privileged(GetCacheManagerConfiguration { manager })
    }

    pub(crate) fn add_manager_listener(
        &self,
        manager: &CacheManager,
        listener: Arc<dyn Listener<ManagerEvent>>,
    ) -> GridResult<ListenerId> {
        self.do_privileged(AddCacheManagerListener { manager, listener })
    }

    /// Issue listener removal. Only the issue is elevated; awaiting the
    /// returned handle is not.
    pub(crate) fn remove_listener_async<L>(&self, listenable: &L, id: ListenerId) -> GridResult<ListenerRemoval>
    where
        L: Listenable + ?Sized,
    {
        self.do_privileged(RemoveListenerAsync { listenable, id })
    }

    /// Strip identity checks from a cache handle. Idempotent.
    pub(crate) fn unwrap_cache(&self, cache: CacheRef) -> GridResult<CacheRef> {
        self.do_privileged(UnwrapCache { cache })
    }

    /// Drop the bound subject from a secure handle so that later checks use
    /// the caller's own subject. Plain handles are returned as given.
    pub(crate) fn anonymize_cache(&self, cache: CacheRef) -> GridResult<CacheRef> {
        self.do_privileged(AnonymizeCache { cache })
    }
}
