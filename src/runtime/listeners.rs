//! Listener registration and asynchronous removal.

use crate::core::error::{GridError, GridResult};
use parking_lot::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Identifier handed out when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Receives events of type `E`.
pub trait Listener<E>: Send + Sync {
    fn on_event(&self, event: &E);
}

impl<E, F> Listener<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        self(event)
    }
}

/// Something listeners can subscribe to.
pub trait Listenable {
    /// Event type delivered to listeners.
    type Event;

    /// Register a listener.
    fn add_listener(&self, listener: Arc<dyn Listener<Self::Event>>) -> GridResult<ListenerId>;

    /// Issue removal of a listener.
    ///
    /// The returned handle completes once the listener no longer receives
    /// events. Removing an unknown or already-removed listener completes
    /// successfully.
    fn remove_listener_async(&self, id: ListenerId) -> GridResult<ListenerRemoval>;
}

/// Completion handle for an issued listener removal.
///
/// Dropping the handle does not cancel the removal.
#[derive(Debug)]
pub struct ListenerRemoval {
    rx: oneshot::Receiver<()>,
}

impl ListenerRemoval {
    fn pending() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }
}

impl Future for ListenerRemoval {
    type Output = GridResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| GridError::ListenerRemovalAborted))
    }
}

/// Listeners for one event source.
pub struct ListenerRegistry<E> {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn Listener<E>>)>>,
}

impl<E> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener and return its id.
    pub fn add(&self, listener: Arc<dyn Listener<E>>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Deliver an event to every registered listener.
    ///
    /// Listeners are invoked outside the registry lock, so a listener may
    /// add or remove listeners.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Arc<dyn Listener<E>>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener.on_event(event);
        }
    }

    /// Remove a listener and return a handle that completes after removal.
    pub fn remove_async(&self, id: ListenerId) -> ListenerRemoval {
        let (tx, removal) = ListenerRemoval::pending();

        let removed = {
            let mut listeners = self.listeners.write();
            let before = listeners.len();
            listeners.retain(|(existing, _)| *existing != id);
            before != listeners.len()
        };

        tracing::debug!(listener = %id, removed, "listener removal issued");
        // The receiver may already be gone; removal still happened.
        let _ = tx.send(());
        removal
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.read().iter().any(|(existing, _)| *existing == id)
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for ListenerRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_reaches_listeners() {
        let registry: ListenerRegistry<u32> = ListenerRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        registry.add(Arc::new(move |value: &u32| {
            counter.fetch_add(*value as usize, Ordering::SeqCst);
        }));

        registry.notify(&3);
        registry.notify(&4);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_remove_async_completes() {
        let registry: ListenerRegistry<u32> = ListenerRegistry::new();
        let id = registry.add(Arc::new(|_: &u32| {}));
        assert!(registry.contains(id));

        registry.remove_async(id).await.unwrap();
        assert!(!registry.contains(id));
        assert!(registry.is_empty());

        // Second removal of the same id is not an error.
        registry.remove_async(id).await.unwrap();
    }

    #[test]
    fn test_ids_are_unique() {
        let registry: ListenerRegistry<()> = ListenerRegistry::new();
        let a = registry.add(Arc::new(|_: &()| {}));
        let b = registry.add(Arc::new(|_: &()| {}));
        assert_ne!(a, b);
        assert_eq!(a.to_string(), format!("listener-{}", a.as_u64()));
    }
}
