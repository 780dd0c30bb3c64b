//! Protocol server tests.

mod common;

use bytes::Bytes;
use common::{admin, application, reader, secured_manager};
use gridcache::core::config::{CacheMode, Configuration, LockingMode, TransactionMode};
use gridcache::core::error::GridError;
use gridcache::core::metadata::Metadata;
use gridcache::policy::CommitProtocol;
use gridcache::runtime::cache::CacheEvent;
use gridcache::security::authz::AuthorizationPermission;
use gridcache::security::context::Security;
use gridcache::server::{ProtocolServer, ServerState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn sessions() -> Configuration {
    let mut cfg = Configuration::default();
    cfg.clustering.cache_mode = CacheMode::DistSync;
    cfg.clustering.segments = 64;
    cfg.expiration.lifespan_ms = Some(60_000);
    cfg
}

fn orders() -> Configuration {
    let mut cfg = Configuration::default();
    cfg.clustering.cache_mode = CacheMode::ReplAsync;
    cfg.transaction.transaction_mode = TransactionMode::Transactional;
    cfg.transaction.locking_mode = LockingMode::Pessimistic;
    cfg
}

fn start_server() -> ProtocolServer {
    let manager = secured_manager(&[("sessions", sessions()), ("orders", orders())]);
    ProtocolServer::start(manager).unwrap()
}

#[test]
fn unprivileged_caller_can_start_server() {
    let manager = secured_manager(&[]);
    // An unprivileged thread can still start the server.
    let server = Security::with_subject(reader(), || {
        ProtocolServer::start(Arc::clone(&manager))
    })
    .unwrap();

    assert_eq!(server.node_name(), "node-1");
    assert!(server.is_clustered());
    assert!(server.is_embedded_mode());
    assert_eq!(server.state(), ServerState::Running);
}

#[test]
fn cache_policy_is_resolved_once_per_cache() {
    let server = start_server();

    let policy = Security::with_subject(reader(), || server.cache_policy("sessions")).unwrap();
    assert_eq!(policy.commit_protocol, CommitProtocol::TwoPhase);
    assert!(policy.segmented);
    assert_eq!(policy.default_metadata.lifespan, Some(Duration::from_secs(60)));
    assert_eq!(server.health().known_caches, 1);

    assert_eq!(server.cache_policy("sessions").unwrap(), policy);
    assert_eq!(server.health().known_caches, 1);

    let orders = server.cache_policy("orders").unwrap();
    assert!(orders.is_one_phase_commit());
    assert_eq!(server.health().known_caches, 2);
}

#[test]
fn unknown_cache_error_reaches_client() {
    let server = start_server();
    let err = server.get("ghost", b"k").unwrap_err();
    assert_eq!(
        err,
        GridError::CacheNotFound {
            name: "ghost".to_string()
        }
    );
    assert_eq!(server.health().failed_requests, 1);
}

#[test]
fn data_operations_use_the_callers_subject() {
    let server = start_server();

    let denied = Security::with_subject(reader(), || {
        server.put(
            "sessions",
            Bytes::from_static(b"s1"),
            Bytes::from_static(b"alice"),
            None,
        )
    });
    assert_eq!(
        denied.unwrap_err(),
        GridError::permission_denied("rita", AuthorizationPermission::Write)
    );

    Security::with_subject(application(), || {
        server.put(
            "sessions",
            Bytes::from_static(b"s1"),
            Bytes::from_static(b"alice"),
            None,
        )
    })
    .unwrap();

    let entry = Security::with_subject(reader(), || server.get("sessions", b"s1"))
        .unwrap()
        .unwrap();
    assert_eq!(entry.value, Bytes::from_static(b"alice"));
    // Default expiration applies when the request carries none.
    assert_eq!(entry.metadata.lifespan, Some(Duration::from_secs(60)));

    // Anonymous callers are denied.
    assert!(server.get("sessions", b"s1").is_err());

    let health = server.health();
    assert_eq!(health.total_requests, 4);
    assert_eq!(health.failed_requests, 2);
}

#[test]
fn request_metadata_overrides_default() {
    let server = start_server();
    let explicit = Metadata::from_millis(Some(5), Some(1));

    Security::with_subject(application(), || {
        server.put(
            "sessions",
            Bytes::from_static(b"k"),
            Bytes::from_static(b"v"),
            Some(explicit),
        )?;
        let entry = server.get("sessions", b"k")?.unwrap();
        assert_eq!(entry.metadata, explicit);
        Ok::<_, GridError>(())
    })
    .unwrap();
}

#[test]
fn stopping_a_cache_forgets_its_info() {
    let manager = secured_manager(&[("sessions", sessions())]);
    let server = ProtocolServer::start(Arc::clone(&manager)).unwrap();

    server.cache_policy("sessions").unwrap();
    assert_eq!(server.health().known_caches, 1);

    Security::with_subject(admin(), || manager.stop_cache("sessions")).unwrap();
    assert_eq!(server.health().known_caches, 0);
    assert_eq!(
        server.cache_policy("sessions").unwrap_err(),
        GridError::CacheNotRunning {
            name: "sessions".to_string()
        }
    );

    // A redefined cache is resolved afresh, with its new configuration.
    let mut local = Configuration::default();
    local.expiration.lifespan_ms = Some(1_000);
    Security::with_subject(admin(), || manager.define_cache("sessions", local)).unwrap();
    let after = server.cache_policy("sessions").unwrap();
    assert!(!after.segmented);
    assert_eq!(after.default_metadata.lifespan, Some(Duration::from_secs(1)));
    assert_eq!(server.health().known_caches, 1);
}

#[tokio::test]
async fn client_listener_lifecycle() {
    let server = start_server();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    let denied = Security::with_subject(reader(), || {
        server.add_client_listener("sessions", Arc::new(|_: &CacheEvent| {}))
    });
    assert!(matches!(denied, Err(GridError::PermissionDenied { .. })));

    let id = Security::with_subject(application(), || {
        server.add_client_listener(
            "sessions",
            Arc::new(move |_: &CacheEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
    })
    .unwrap();

    let write = |value: &'static [u8]| {
        Security::with_subject(application(), || {
            server.put("sessions", Bytes::from_static(b"k"), Bytes::from_static(value), None)
        })
        .unwrap();
    };

    write(b"1");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    Security::with_subject(application(), || server.remove_client_listener("sessions", id))
        .await
        .unwrap();
    write(b"2");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Removing again is not an error.
    Security::with_subject(application(), || server.remove_client_listener("sessions", id))
        .await
        .unwrap();
}

#[tokio::test]
async fn listeners_of_a_stopped_cache_are_forgotten() {
    let manager = secured_manager(&[("sessions", sessions())]);
    let server = ProtocolServer::start(Arc::clone(&manager)).unwrap();

    let id = Security::with_subject(application(), || {
        server.add_client_listener("sessions", Arc::new(|_: &CacheEvent| {}))
    })
    .unwrap();
    Security::with_subject(admin(), || {
        manager.stop_cache("sessions")?;
        manager.define_cache("sessions", sessions())
    })
    .unwrap();

    // The redefined cache hands out ids afresh; the old owner has no claim.
    let reused = Security::with_subject(admin(), || {
        server.add_client_listener("sessions", Arc::new(|_: &CacheEvent| {}))
    })
    .unwrap();
    assert_eq!(reused, id);
    let result = Security::with_subject(application(), || {
        server.remove_client_listener("sessions", id)
    })
    .await;
    assert_eq!(
        result.unwrap_err(),
        GridError::ListenerNotOwned { id: id.as_u64() }
    );
}

#[tokio::test]
async fn stop_unsubscribes_from_manager() {
    let manager = secured_manager(&[("sessions", sessions())]);
    let server = ProtocolServer::start(Arc::clone(&manager)).unwrap();
    server.cache_policy("sessions").unwrap();

    server.stop().await.unwrap();
    let health = server.health();
    assert_eq!(health.state, ServerState::Stopped);
    assert_eq!(health.known_caches, 0);
    assert!(matches!(
        server.cache_policy("sessions"),
        Err(GridError::ComponentUnavailable { .. })
    ));

    // Manager events no longer reach the stopped server.
    Security::with_subject(admin(), || manager.stop_cache("sessions")).unwrap();
    assert_eq!(server.health().known_caches, 0);
}
