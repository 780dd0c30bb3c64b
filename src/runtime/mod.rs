//! Runtime handles read through by the privilege gate.
//!
//! - [`manager`] - Cache manager and lifecycle events
//! - [`cache`] - Embedded caches, secure wrappers and caller handles
//! - [`registry`] - Component registries and distribution manager
//! - [`listeners`] - Listener registration and asynchronous removal

pub mod cache;
pub mod listeners;
pub mod manager;
pub mod registry;

pub use cache::{CacheEntry, CacheEvent, CacheRef, EmbeddedCache, SecureCache};
pub use listeners::{Listenable, Listener, ListenerId, ListenerRegistry, ListenerRemoval};
pub use manager::{CacheManager, ManagerEvent};
pub use registry::{ComponentRegistry, ComponentStatus, DistributionManager, GlobalComponentRegistry};
