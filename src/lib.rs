//! gridcache - consistency policy resolution and privileged server access for
//! a replicated transactional cache.
//!
//! Two concerns live here. The policy resolver turns a cache configuration
//! into the consistency decisions the rest of the system needs: commit
//! protocol, versioning, segmentation, state-transfer eligibility and default
//! entry expiration. The privilege gate lets the protocol server read
//! security-sensitive runtime handles while the thread runs with a less
//! privileged caller's subject.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Protocol Server                          │
//! │        cache info memoization │ put/get │ client listeners      │
//! └─────────────────────────────────────────────────────────────────┘
//!                │                                   │
//! ┌──────────────────────────────┐  ┌──────────────────────────────┐
//! │        Privilege Gate        │  │       Policy Resolver        │
//! │ closed actions │ elevation   │  │  commit │ MVCC │ segments    │
//! └──────────────────────────────┘  └──────────────────────────────┘
//!                │                                   │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Cache Runtime                           │
//! │   CacheManager │ EmbeddedCache │ SecureCache │ registries       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::error`] - Error types
//! - [`core::metadata`] - Entry expiration metadata
//!
//! ## Policy
//! - [`policy::resolver`] - Consistency decision functions
//! - [`policy::facts`] - Resolved facts per configuration
//!
//! ## Security
//! - [`security::authz`] - Permissions, subjects and authorizer
//! - [`security::context`] - Thread-local subject and privileged scope
//! - [`security::enforcement`] - Process-wide enforcement switch
//! - `security::actions`, `security::gate` - Privileged action catalogue and the
//!   gate that runs it; crate-private, reachable only by the protocol server
//!
//! ## Runtime
//! - [`runtime::manager`] - Cache manager
//! - [`runtime::cache`] - Cache handles
//! - [`runtime::registry`] - Component registries
//! - [`runtime::listeners`] - Listener registration and removal
//!
//! ## Server
//! - [`server::handler`] - Protocol request handling
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Key Invariants
//!
//! - Policy resolution is pure; the same configuration always yields the same facts
//! - Exception-based eviction always forces two-phase commit
//! - Elevation never outlives the privileged call that acquired it
//! - Only code inside this crate can elevate
//! - The gate returns the wrapped operation's errors unchanged

// Core infrastructure
pub mod core;

// Consistency policy
pub mod policy;

// Authorization and privilege elevation
pub mod security;

// Cache runtime
pub mod runtime;

// Protocol server
pub mod server;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, metadata};
pub use policy::{facts, resolver};
pub use runtime::{cache, listeners, manager, registry};
pub use security::{authz, context, enforcement};
pub use server::handler;
