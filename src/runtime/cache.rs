//! Cache handles.
//!
//! An [`EmbeddedCache`] performs no identity checks. A [`SecureCache`] wraps
//! one and checks the effective subject on every operation: the subject bound
//! to the wrapper if any, otherwise the thread's current subject. Callers hold
//! a [`CacheRef`], which is one or the other.

use super::listeners::{Listenable, Listener, ListenerId, ListenerRegistry, ListenerRemoval};
use super::registry::{ComponentRegistry, DistributionManager};
use crate::core::config::Configuration;
use crate::core::error::{GridError, GridResult};
use crate::core::metadata::Metadata;
use crate::security::authz::{AuthorizationPermission, Authorizer, Subject};
use crate::security::context::Security;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Events delivered to cache listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    EntryCreated { key: Bytes },
    EntryModified { key: Bytes },
}

/// A stored value and its expiration metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: Bytes,
    pub metadata: Metadata,
}

/// A cache without identity checks.
#[derive(Debug)]
pub struct EmbeddedCache {
    name: String,
    registry: Arc<ComponentRegistry>,
    entries: RwLock<HashMap<Bytes, CacheEntry>>,
    listeners: ListenerRegistry<CacheEvent>,
}

impl EmbeddedCache {
    pub(crate) fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            name: registry.cache_name().to_string(),
            registry,
            entries: RwLock::new(HashMap::new()),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> Arc<Configuration> {
        self.registry.configuration()
    }

    pub fn component_registry(&self) -> Arc<ComponentRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn distribution_manager(&self) -> Option<Arc<DistributionManager>> {
        self.registry.distribution_manager()
    }

    fn ensure_running(&self) -> GridResult<()> {
        if self.registry.is_running() {
            Ok(())
        } else {
            Err(GridError::CacheNotRunning {
                name: self.name.clone(),
            })
        }
    }

    /// Store a value, returning the previous one.
    ///
    /// Without caller-supplied metadata the entry gets the cache's default
    /// expiration.
    pub fn put(
        &self,
        key: Bytes,
        value: Bytes,
        metadata: Option<Metadata>,
    ) -> GridResult<Option<Bytes>> {
        self.ensure_running()?;
        let metadata = metadata.unwrap_or(self.registry.policy().default_metadata);

        let previous = self
            .entries
            .write()
            .insert(key.clone(), CacheEntry { value, metadata })
            .map(|entry| entry.value);

        let event = if previous.is_some() {
            CacheEvent::EntryModified { key }
        } else {
            CacheEvent::EntryCreated { key }
        };
        self.listeners.notify(&event);
        Ok(previous)
    }

    pub fn get(&self, key: &[u8]) -> GridResult<Option<CacheEntry>> {
        self.ensure_running()?;
        Ok(self.entries.read().get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Listenable for EmbeddedCache {
    type Event = CacheEvent;

    fn add_listener(&self, listener: Arc<dyn Listener<CacheEvent>>) -> GridResult<ListenerId> {
        Ok(self.listeners.add(listener))
    }

    fn remove_listener_async(&self, id: ListenerId) -> GridResult<ListenerRemoval> {
        Ok(self.listeners.remove_async(id))
    }
}

/// A subject-checking wrapper around an [`EmbeddedCache`].
#[derive(Debug, Clone)]
pub struct SecureCache {
    delegate: Arc<EmbeddedCache>,
    authorizer: Arc<Authorizer>,
    subject: Option<Subject>,
}

impl SecureCache {
    /// Wrap a cache with no bound subject; checks use the thread's subject.
    pub fn new(delegate: Arc<EmbeddedCache>, authorizer: Arc<Authorizer>) -> Self {
        Self {
            delegate,
            authorizer,
            subject: None,
        }
    }

    /// Wrap a cache with a bound subject used for every check.
    pub fn with_subject(
        delegate: Arc<EmbeddedCache>,
        authorizer: Arc<Authorizer>,
        subject: Subject,
    ) -> Self {
        Self {
            delegate,
            authorizer,
            subject: Some(subject),
        }
    }

    pub fn bound_subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn name(&self) -> &str {
        self.delegate.name()
    }

    pub(crate) fn authorizer(&self) -> &Arc<Authorizer> {
        &self.authorizer
    }

    fn check(&self, permission: AuthorizationPermission) -> GridResult<()> {
        match &self.subject {
            Some(subject) => self.authorizer.check_permission(Some(subject), permission),
            None => self
                .authorizer
                .check_permission(Security::current_subject().as_ref(), permission),
        }
    }

    /// The unchecked cache behind this wrapper.
    pub fn delegate(&self) -> GridResult<Arc<EmbeddedCache>> {
        self.check(AuthorizationPermission::Admin)?;
        Ok(Arc::clone(&self.delegate))
    }

    pub fn configuration(&self) -> GridResult<Arc<Configuration>> {
        self.check(AuthorizationPermission::Admin)?;
        Ok(self.delegate.configuration())
    }

    pub fn component_registry(&self) -> GridResult<Arc<ComponentRegistry>> {
        self.check(AuthorizationPermission::Admin)?;
        Ok(self.delegate.component_registry())
    }

    pub fn distribution_manager(&self) -> GridResult<Option<Arc<DistributionManager>>> {
        self.check(AuthorizationPermission::Admin)?;
        Ok(self.delegate.distribution_manager())
    }

    pub fn put(
        &self,
        key: Bytes,
        value: Bytes,
        metadata: Option<Metadata>,
    ) -> GridResult<Option<Bytes>> {
        self.check(AuthorizationPermission::Write)?;
        self.delegate.put(key, value, metadata)
    }

    pub fn get(&self, key: &[u8]) -> GridResult<Option<CacheEntry>> {
        self.check(AuthorizationPermission::Read)?;
        self.delegate.get(key)
    }
}

impl Listenable for SecureCache {
    type Event = CacheEvent;

    fn add_listener(&self, listener: Arc<dyn Listener<CacheEvent>>) -> GridResult<ListenerId> {
        self.check(AuthorizationPermission::Listen)?;
        self.delegate.add_listener(listener)
    }

    fn remove_listener_async(&self, id: ListenerId) -> GridResult<ListenerRemoval> {
        self.check(AuthorizationPermission::Listen)?;
        self.delegate.remove_listener_async(id)
    }
}

/// A cache as handed to callers.
#[derive(Debug, Clone)]
pub enum CacheRef {
    Plain(Arc<EmbeddedCache>),
    Secure(SecureCache),
}

impl CacheRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(cache) => cache.name(),
            Self::Secure(cache) => cache.name(),
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure(_))
    }

    /// Subject bound to a secure wrapper; `None` for plain caches and anonymous wrappers.
    pub fn bound_subject(&self) -> Option<&Subject> {
        match self {
            Self::Plain(_) => None,
            Self::Secure(cache) => cache.bound_subject(),
        }
    }

    /// Check a permission for this handle's effective subject. Plain handles
    /// do no checks.
    pub(crate) fn authorize(&self, permission: AuthorizationPermission) -> GridResult<()> {
        match self {
            Self::Plain(_) => Ok(()),
            Self::Secure(cache) => cache.check(permission),
        }
    }

    /// Check if both handles are the same instance: same variant, same
    /// underlying cache, same bound subject.
    pub fn same_instance(&self, other: &CacheRef) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => Arc::ptr_eq(a, b),
            (Self::Secure(a), Self::Secure(b)) => {
                Arc::ptr_eq(&a.delegate, &b.delegate) && a.subject == b.subject
            }
            _ => false,
        }
    }

    pub fn configuration(&self) -> GridResult<Arc<Configuration>> {
        match self {
            Self::Plain(cache) => Ok(cache.configuration()),
            Self::Secure(cache) => cache.configuration(),
        }
    }

    pub fn component_registry(&self) -> GridResult<Arc<ComponentRegistry>> {
        match self {
            Self::Plain(cache) => Ok(cache.component_registry()),
            Self::Secure(cache) => cache.component_registry(),
        }
    }

    pub fn distribution_manager(&self) -> GridResult<Option<Arc<DistributionManager>>> {
        match self {
            Self::Plain(cache) => Ok(cache.distribution_manager()),
            Self::Secure(cache) => cache.distribution_manager(),
        }
    }

    pub fn put(
        &self,
        key: Bytes,
        value: Bytes,
        metadata: Option<Metadata>,
    ) -> GridResult<Option<Bytes>> {
        match self {
            Self::Plain(cache) => cache.put(key, value, metadata),
            Self::Secure(cache) => cache.put(key, value, metadata),
        }
    }

    pub fn get(&self, key: &[u8]) -> GridResult<Option<CacheEntry>> {
        match self {
            Self::Plain(cache) => cache.get(key),
            Self::Secure(cache) => cache.get(key),
        }
    }
}

impl Listenable for CacheRef {
    type Event = CacheEvent;

    fn add_listener(&self, listener: Arc<dyn Listener<CacheEvent>>) -> GridResult<ListenerId> {
        match self {
            Self::Plain(cache) => cache.add_listener(listener),
            Self::Secure(cache) => cache.add_listener(listener),
        }
    }

    fn remove_listener_async(&self, id: ListenerId) -> GridResult<ListenerRemoval> {
        match self {
            Self::Plain(cache) => cache.remove_listener_async(id),
            Self::Secure(cache) => cache.remove_listener_async(id),
        }
    }
}
