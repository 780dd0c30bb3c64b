//! Request handling.

use super::{ServerHealth, ServerState};
use crate::core::config::{CacheMode, Configuration};
use crate::core::error::{GridError, GridResult};
use crate::core::metadata::Metadata;
use crate::policy::{is_clustered, is_embedded_mode, PolicyFacts};
use crate::runtime::cache::{CacheEntry, CacheEvent, CacheRef};
use crate::runtime::listeners::{Listenable, Listener, ListenerId};
use crate::runtime::manager::{CacheManager, ManagerEvent};
use crate::runtime::registry::{ComponentRegistry, DistributionManager};
use crate::security::authz::AuthorizationPermission;
use crate::security::context::Security;
use crate::security::gate::PrivilegeGate;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type KnownCaches = RwLock<HashMap<String, Arc<CacheInfo>>>;
type ClientListeners = Mutex<HashMap<(String, ListenerId), ClientListener>>;

/// What the server needs to know about one cache, resolved once.
///
/// Holds handles read with the server's rights, so it never leaves the crate.
#[derive(Debug)]
pub(crate) struct CacheInfo {
    pub name: String,

    /// Secure handle with no bound subject; operations check the caller.
    pub cache: CacheRef,

    pub configuration: Arc<Configuration>,

    pub registry: Arc<ComponentRegistry>,

    /// `None` for local caches.
    pub distribution: Option<Arc<DistributionManager>>,

    pub policy: PolicyFacts,
}

impl CacheInfo {
    pub(crate) fn cache_mode(&self) -> CacheMode {
        self.configuration.clustering.cache_mode
    }

    /// Segments routed by this node; 1 for local and unsegmented caches.
    pub(crate) fn segment_count(&self) -> u32 {
        self.distribution
            .as_ref()
            .map_or(1, |dm| dm.segment_count())
    }
}

/// A listener registered on behalf of a client.
#[derive(Debug)]
struct ClientListener {
    cache: CacheRef,
    /// Subject that registered the listener; `None` for anonymous callers.
    owner: Option<String>,
}

/// Protocol server bound to one cache manager.
pub struct ProtocolServer {
    manager: Arc<CacheManager>,
    gate: PrivilegeGate,
    node_name: String,
    embedded: bool,
    clustered: bool,
    state: RwLock<ServerState>,
    known_caches: Arc<KnownCaches>,
    client_listeners: Arc<ClientListeners>,
    lifecycle_listener: Mutex<Option<ListenerId>>,
    total_requests: AtomicU64,
    failed_requests: AtomicU64,
}

impl ProtocolServer {
    /// Start serving a manager.
    ///
    /// Reads the manager configuration and global registry with the server's
    /// rights and subscribes to cache lifecycle events so that info for
    /// stopped caches is forgotten. Fails if the process enforcement refuses
    /// to elevate the server.
    pub fn start(manager: Arc<CacheManager>) -> GridResult<Self> {
        Self::with_gate(manager, PrivilegeGate::new())
    }

    pub(crate) fn with_gate(manager: Arc<CacheManager>, gate: PrivilegeGate) -> GridResult<Self> {
        let global = gate.manager_configuration(&manager)?;
        let global_registry = gate.global_component_registry(&manager)?;

        let known_caches: Arc<KnownCaches> = Arc::new(RwLock::new(HashMap::new()));
        let client_listeners: Arc<ClientListeners> = Arc::new(Mutex::new(HashMap::new()));
        let weak_known = Arc::downgrade(&known_caches);
        let weak_clients = Arc::downgrade(&client_listeners);
        let listener_id = gate.add_manager_listener(
            &manager,
            Arc::new(move |event: &ManagerEvent| {
                forget_stopped(&weak_known, &weak_clients, event)
            }),
        )?;

        let server = Self {
            node_name: global_registry.node_name().to_string(),
            embedded: is_embedded_mode(&global),
            clustered: is_clustered(&global),
            manager,
            gate,
            state: RwLock::new(ServerState::Running),
            known_caches,
            client_listeners,
            lifecycle_listener: Mutex::new(Some(listener_id)),
            total_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
        };

        tracing::info!(
            node = %server.node_name,
            embedded = server.embedded,
            clustered = server.clustered,
            "protocol server started"
        );
        Ok(server)
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Check if the manager runs without the server's private module.
    pub fn is_embedded_mode(&self) -> bool {
        self.embedded
    }

    pub fn is_clustered(&self) -> bool {
        self.clustered
    }

    pub fn state(&self) -> ServerState {
        *self.state.read()
    }

    pub fn health(&self) -> ServerHealth {
        ServerHealth {
            state: self.state(),
            known_caches: self.known_caches.read().len(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }

    fn ensure_running(&self) -> GridResult<()> {
        match self.state() {
            ServerState::Running => Ok(()),
            ServerState::Stopped => Err(GridError::component_unavailable("protocol server")),
        }
    }

    fn track<T>(&self, result: GridResult<T>) -> GridResult<T> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if result.is_err() {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Policy facts of a running cache.
    pub fn cache_policy(&self, name: &str) -> GridResult<PolicyFacts> {
        self.cache_info(name).map(|info| info.policy.clone())
    }

    /// Info for a running cache, memoized until the cache stops.
    pub(crate) fn cache_info(&self, name: &str) -> GridResult<Arc<CacheInfo>> {
        self.ensure_running()?;

        if let Some(info) = self.known_caches.read().get(name) {
            return Ok(Arc::clone(info));
        }

        let info = Arc::new(self.resolve_cache_info(name)?);
        self.memoize(name, info)
    }

    /// Server state and cache status are both checked under the write lock:
    /// `stop` and the lifecycle listener clear entries under the same lock
    /// after changing them, so nothing is inserted behind their back.
    fn memoize(&self, name: &str, info: Arc<CacheInfo>) -> GridResult<Arc<CacheInfo>> {
        let mut known = self.known_caches.write();
        self.ensure_running()?;
        if !info.registry.is_running() {
            return Ok(info);
        }
        let entry = known
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&info));
        Ok(Arc::clone(entry))
    }

    fn resolve_cache_info(&self, name: &str) -> GridResult<CacheInfo> {
        let cache = self.gate.cache_by_name(&self.manager, name)?;
        let cache = self.gate.anonymize_cache(cache)?;
        let configuration = self.gate.cache_configuration(&cache)?;
        let registry = self.gate.component_registry(&cache)?;
        let distribution = self.gate.distribution_manager(&cache)?;
        let policy = registry.policy().clone();

        tracing::debug!(
            cache = %name,
            commit_protocol = %policy.commit_protocol,
            segmented = policy.segmented,
            "resolved cache info"
        );

        Ok(CacheInfo {
            name: name.to_string(),
            cache,
            configuration,
            registry,
            distribution,
            policy,
        })
    }

    /// Store a value as the calling subject.
    ///
    /// Requests without metadata get the cache's default expiration.
    pub fn put(
        &self,
        cache: &str,
        key: Bytes,
        value: Bytes,
        metadata: Option<Metadata>,
    ) -> GridResult<Option<Bytes>> {
        let result = self.cache_info(cache).and_then(|info| {
            let metadata = metadata.unwrap_or(info.policy.default_metadata);
            info.cache.put(key, value, Some(metadata))
        });
        self.track(result)
    }

    /// Read a value as the calling subject.
    pub fn get(&self, cache: &str, key: &[u8]) -> GridResult<Option<CacheEntry>> {
        let result = self.cache_info(cache).and_then(|info| info.cache.get(key));
        self.track(result)
    }

    /// Register a client listener. Requires `LISTEN` for the calling subject,
    /// who becomes the listener's owner.
    pub fn add_client_listener(
        &self,
        cache: &str,
        listener: Arc<dyn Listener<CacheEvent>>,
    ) -> GridResult<ListenerId> {
        let result = self.cache_info(cache).and_then(|info| {
            let id = info.cache.add_listener(listener)?;
            self.client_listeners.lock().insert(
                (info.name.clone(), id),
                ClientListener {
                    cache: info.cache.clone(),
                    owner: caller_name(),
                },
            );
            Ok(id)
        });
        self.track(result)
    }

    /// Remove a client listener and wait until it no longer receives events.
    ///
    /// Requires `LISTEN` for the calling subject, and only the subject that
    /// registered a listener may remove it. Ids this server never handed out,
    /// or already removed, succeed without effect. Checks run when called,
    /// on the caller's thread; the returned future only awaits the removal.
    pub fn remove_client_listener(
        &self,
        cache: &str,
        id: ListenerId,
    ) -> impl Future<Output = GridResult<()>> + '_ {
        let removal = self.cache_info(cache).and_then(|info| {
            info.cache.authorize(AuthorizationPermission::Listen)?;

            let key = (info.name.clone(), id);
            let mut clients = self.client_listeners.lock();
            match clients.get(&key) {
                None => return Ok(None),
                Some(client) if client.owner != caller_name() => {
                    tracing::debug!(cache = %info.name, %id, "refused removal of foreign listener");
                    return Err(GridError::ListenerNotOwned { id: id.as_u64() });
                }
                Some(_) => {}
            }
            clients.remove(&key);
            drop(clients);

            info.cache.remove_listener_async(id).map(Some)
        });

        async move {
            let result = match removal {
                Ok(Some(removal)) => removal.await,
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            };
            self.track(result)
        }
    }

    /// Stop serving. Unsubscribes from the manager, removes every client
    /// listener still registered and forgets all cache info.
    pub async fn stop(&self) -> GridResult<()> {
        let listener = self.lifecycle_listener.lock().take();
        if let Some(id) = listener {
            self.gate
                .remove_listener_async(&*self.manager, id)?
                .await?;
        }

        *self.state.write() = ServerState::Stopped;
        self.known_caches.write().clear();

        let clients: Vec<_> = self.client_listeners.lock().drain().collect();
        for ((cache, id), client) in clients {
            // The client is gone; its listener goes with the server's rights.
            if let Err(err) = self.unsubscribe(&client.cache, id).await {
                tracing::warn!(cache = %cache, %id, error = %err, "failed to remove client listener");
            }
        }

        tracing::info!(node = %self.node_name, "protocol server stopped");
        Ok(())
    }

    async fn unsubscribe(&self, cache: &CacheRef, id: ListenerId) -> GridResult<()> {
        let unwrapped = self.gate.unwrap_cache(cache.clone())?;
        let removal = self.gate.remove_listener_async(&unwrapped, id)?;
        removal.await
    }
}

impl std::fmt::Debug for ProtocolServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolServer")
            .field("node_name", &self.node_name)
            .field("embedded", &self.embedded)
            .field("clustered", &self.clustered)
            .field("state", &self.state())
            .finish()
    }
}

fn caller_name() -> Option<String> {
    Security::current_subject().map(|subject| subject.name().to_string())
}

fn forget_stopped(known: &Weak<KnownCaches>, clients: &Weak<ClientListeners>, event: &ManagerEvent) {
    let ManagerEvent::CacheStopped { name } = event else {
        return;
    };
    if let Some(known) = known.upgrade() {
        if known.write().remove(name).is_some() {
            tracing::debug!(cache = %name, "forgot cache info");
        }
    }
    // Listeners of a stopped cache die with it.
    if let Some(clients) = clients.upgrade() {
        clients.lock().retain(|(cache, _), _| cache != name);
    }
}
