//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use gridcache::core::config::{
    CacheMode, Configuration, EvictionStrategy, GlobalConfiguration, GlobalSecurityConfiguration,
    LockingMode, ServerConfig, StoreConfiguration, TransactionMode, TransportConfiguration,
};
use gridcache::runtime::manager::CacheManager;
use gridcache::security::authz::{AuthorizationPermission, Subject};
use gridcache::security::context::Security;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Create a minimal valid configuration file.
pub fn create_minimal_config() -> NamedTempFile {
    write_config(
        r#"
[caches.default]
"#,
    )
}

/// Create a clustered configuration with the given cache mode and log level.
pub fn create_config_with_settings(cache_mode: &str, log_level: &str) -> NamedTempFile {
    write_config(&format!(
        r#"
[global]
node_name = "node-1"

[global.transport]
cluster_name = "test"

[caches.main.clustering]
cache_mode = "{}"

[telemetry]
log_level = "{}"
"#,
        cache_mode, log_level
    ))
}

/// Write arbitrary TOML to a temp file.
pub fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Load a config from a temp file.
pub fn load_config(file: &NamedTempFile) -> ServerConfig {
    ServerConfig::from_file(file.path()).expect("Failed to load config")
}

/// Build a cache configuration from its policy-relevant settings.
pub fn cache_config(
    mode: CacheMode,
    transactional: bool,
    locking: LockingMode,
    eviction: EvictionStrategy,
) -> Configuration {
    let mut cfg = Configuration::default();
    cfg.clustering.cache_mode = mode;
    cfg.transaction.transaction_mode = if transactional {
        TransactionMode::Transactional
    } else {
        TransactionMode::NonTransactional
    };
    cfg.transaction.locking_mode = locking;
    cfg.memory.eviction_strategy = eviction;
    cfg
}

/// A store with the given flags.
pub fn store(shared: bool, fetch_persistent_state: bool) -> StoreConfiguration {
    StoreConfiguration {
        shared,
        fetch_persistent_state,
        segmented: false,
    }
}

/// Every cache mode.
pub const ALL_MODES: [CacheMode; 9] = [
    CacheMode::Local,
    CacheMode::ReplSync,
    CacheMode::ReplAsync,
    CacheMode::DistSync,
    CacheMode::DistAsync,
    CacheMode::ScatteredSync,
    CacheMode::ScatteredAsync,
    CacheMode::InvalidationSync,
    CacheMode::InvalidationAsync,
];

/// Clustered manager configuration with authorization enabled.
///
/// Roles: `admin` holds ALL, `app` holds READ/WRITE/LISTEN, `reader` holds READ.
pub fn secured_global() -> GlobalConfiguration {
    let mut roles = BTreeMap::new();
    roles.insert(
        "admin".to_string(),
        BTreeSet::from([AuthorizationPermission::All]),
    );
    roles.insert(
        "app".to_string(),
        BTreeSet::from([
            AuthorizationPermission::Read,
            AuthorizationPermission::Write,
            AuthorizationPermission::Listen,
        ]),
    );
    roles.insert(
        "reader".to_string(),
        BTreeSet::from([AuthorizationPermission::Read]),
    );

    GlobalConfiguration {
        node_name: "node-1".to_string(),
        transport: Some(TransportConfiguration::default()),
        security: GlobalSecurityConfiguration {
            authorization: true,
            roles,
        },
        ..Default::default()
    }
}

pub fn admin() -> Subject {
    Subject::new("root").with_role("admin")
}

pub fn application() -> Subject {
    Subject::new("app-user").with_role("app")
}

pub fn reader() -> Subject {
    Subject::new("rita").with_role("reader")
}

/// Create a secured manager and define caches as the admin subject.
pub fn secured_manager(caches: &[(&str, Configuration)]) -> Arc<CacheManager> {
    let manager = CacheManager::new(secured_global());
    Security::with_subject(admin(), || {
        for (name, cfg) in caches {
            manager
                .define_cache(name, cfg.clone())
                .expect("Failed to define cache");
        }
    });
    Arc::new(manager)
}

/// Assert that a result is Ok and return the value.
#[track_caller]
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a result is Err.
#[track_caller]
pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
        Err(e) => e,
    }
}
