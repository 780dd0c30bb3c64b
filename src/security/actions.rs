//! The closed catalogue of privileged actions.
//!
//! Each action is a struct bound to its targets when constructed. The trait is
//! crate-private, so nothing outside this module set can add an action or pass
//! arbitrary code to the elevation boundary.

use crate::core::config::{Configuration, GlobalConfiguration};
use crate::core::error::GridResult;
use crate::runtime::cache::{CacheRef, SecureCache};
use crate::runtime::listeners::{Listenable, Listener, ListenerId, ListenerRemoval};
use crate::runtime::manager::{CacheManager, ManagerEvent};
use crate::runtime::registry::{ComponentRegistry, DistributionManager, GlobalComponentRegistry};
use std::sync::Arc;

/// Every privileged action the gate can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ActionKind {
    GetCacheComponentRegistry,
    GetCacheConfiguration,
    GetDistributionManager,
    GetCache,
    GetGlobalComponentRegistry,
    GetCacheManagerConfiguration,
    AddCacheManagerListener,
    RemoveListenerAsync,
    UnwrapCache,
    AnonymizeCache,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GetCacheComponentRegistry => "get-cache-component-registry",
            Self::GetCacheConfiguration => "get-cache-configuration",
            Self::GetDistributionManager => "get-distribution-manager",
            Self::GetCache => "get-cache",
            Self::GetGlobalComponentRegistry => "get-global-component-registry",
            Self::GetCacheManagerConfiguration => "get-cache-manager-configuration",
            Self::AddCacheManagerListener => "add-cache-manager-listener",
            Self::RemoveListenerAsync => "remove-listener-async",
            Self::UnwrapCache => "unwrap-cache",
            Self::AnonymizeCache => "anonymize-cache",
        };
        write!(f, "{}", name)
    }
}

/// An action run inside a privileged scope.
pub(crate) trait PrivilegedAction {
    type Output;

    const KIND: ActionKind;

    fn run(self) -> GridResult<Self::Output>;
}

pub(crate) struct GetCacheComponentRegistry<'a> {
    pub cache: &'a CacheRef,
}

impl PrivilegedAction for GetCacheComponentRegistry<'_> {
    type Output = Arc<ComponentRegistry>;
    const KIND: ActionKind = ActionKind::GetCacheComponentRegistry;

    fn run(self) -> GridResult<Self::Output> {
        self.cache.component_registry()
    }
}

pub(crate) struct GetCacheConfiguration<'a> {
    pub cache: &'a CacheRef,
}

impl PrivilegedAction for GetCacheConfiguration<'_> {
    type Output = Arc<Configuration>;
    const KIND: ActionKind = ActionKind::GetCacheConfiguration;

    fn run(self) -> GridResult<Self::Output> {
        self.cache.configuration()
    }
}

pub(crate) struct GetDistributionManager<'a> {
    pub cache: &'a CacheRef,
}

impl PrivilegedAction for GetDistributionManager<'_> {
    type Output = Option<Arc<DistributionManager>>;
    const KIND: ActionKind = ActionKind::GetDistributionManager;

    fn run(self) -> GridResult<Self::Output> {
        self.cache.distribution_manager()
    }
}

pub(crate) struct GetCache<'a> {
    pub manager: &'a CacheManager,
    pub name: &'a str,
}

impl PrivilegedAction for GetCache<'_> {
    type Output = CacheRef;
    const KIND: ActionKind = ActionKind::GetCache;

    fn run(self) -> GridResult<Self::Output> {
        self.manager.get_cache(self.name)
    }
}

pub(crate) struct GetGlobalComponentRegistry<'a> {
    pub manager: &'a CacheManager,
}

impl PrivilegedAction for GetGlobalComponentRegistry<'_> {
    type Output = Arc<GlobalComponentRegistry>;
    const KIND: ActionKind = ActionKind::GetGlobalComponentRegistry;

    fn run(self) -> GridResult<Self::Output> {
        self.manager.global_component_registry()
    }
}

pub(crate) struct GetCacheManagerConfiguration<'a> {
    pub manager: &'a CacheManager,
}

impl PrivilegedAction for GetCacheManagerConfiguration<'_> {
    type Output = Arc<GlobalConfiguration>;
    const KIND: ActionKind = ActionKind::GetCacheManagerConfiguration;

    fn run(self) -> GridResult<Self::Output> {
        self.manager.configuration()
    }
}

pub(crate) struct AddCacheManagerListener<'a> {
    pub manager: &'a CacheManager,
    pub listener: Arc<dyn Listener<ManagerEvent>>,
}

impl PrivilegedAction for AddCacheManagerListener<'_> {
    type Output = ListenerId;
    const KIND: ActionKind = ActionKind::AddCacheManagerListener;

    fn run(self) -> GridResult<Self::Output> {
        self.manager.add_listener(self.listener)
    }
}

pub(crate) struct RemoveListenerAsync<'a, L: Listenable + ?Sized> {
    pub listenable: &'a L,
    pub id: ListenerId,
}

impl<L: Listenable + ?Sized> PrivilegedAction for RemoveListenerAsync<'_, L> {
    type Output = ListenerRemoval;
    const KIND: ActionKind = ActionKind::RemoveListenerAsync;

    fn run(self) -> GridResult<Self::Output> {
        self.listenable.remove_listener_async(self.id)
    }
}

/// Strip the identity-checking wrapper. Plain caches pass through.
pub(crate) struct UnwrapCache {
    pub cache: CacheRef,
}

impl PrivilegedAction for UnwrapCache {
    type Output = CacheRef;
    const KIND: ActionKind = ActionKind::UnwrapCache;

    fn run(self) -> GridResult<Self::Output> {
        match self.cache {
            CacheRef::Secure(secure) => Ok(CacheRef::Plain(secure.delegate()?)),
            plain @ CacheRef::Plain(_) => Ok(plain),
        }
    }
}

/// Rebuild a secure wrapper with no bound subject. Plain caches pass through.
pub(crate) struct AnonymizeCache {
    pub cache: CacheRef,
}

impl PrivilegedAction for AnonymizeCache {
    type Output = CacheRef;
    const KIND: ActionKind = ActionKind::AnonymizeCache;

    fn run(self) -> GridResult<Self::Output> {
        match self.cache {
            CacheRef::Secure(secure) => Ok(CacheRef::Secure(SecureCache::new(
                secure.delegate()?,
                Arc::clone(secure.authorizer()),
            ))),
            plain @ CacheRef::Plain(_) => Ok(plain),
        }
    }
}
