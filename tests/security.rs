//! Authorization tests from outside the crate.
//!
//! Only the public API is used here: the manager, cache handles and the
//! protocol server. None of it lets a restricted subject act with more rights
//! than its roles grant.

mod common;

use bytes::Bytes;
use common::{admin, application, assert_err, assert_ok, reader, secured_manager};
use gridcache::core::config::{CacheMode, Configuration};
use gridcache::core::error::GridError;
use gridcache::runtime::cache::{CacheEvent, CacheRef};
use gridcache::runtime::listeners::Listenable;
use gridcache::runtime::manager::ManagerEvent;
use gridcache::security::authz::AuthorizationPermission;
use gridcache::security::context::Security;
use gridcache::security::enforcement::process_enforcement;
use gridcache::server::ProtocolServer;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn repl() -> Configuration {
    let mut cfg = Configuration::default();
    cfg.clustering.cache_mode = CacheMode::ReplSync;
    cfg
}

fn put(cache: &CacheRef, value: &'static [u8]) -> Result<Option<Bytes>, GridError> {
    cache.put(Bytes::from_static(b"k"), Bytes::from_static(value), None)
}

#[test]
fn default_enforcement_is_absent() {
    assert!(!process_enforcement().is_standing());
}

#[test]
fn restricted_subject_cannot_reach_internals_through_manager() {
    let manager = secured_manager(&[("orders", repl())]);
    let admin_only = GridError::permission_denied("rita", AuthorizationPermission::Admin);

    Security::with_subject(reader(), || {
        assert_eq!(assert_err(manager.configuration()), admin_only);
        assert_eq!(assert_err(manager.global_component_registry()), admin_only);
        assert!(manager.define_cache("mine", Configuration::default()).is_err());
        assert!(manager.stop_cache("orders").is_err());

        let cache = assert_ok(manager.get_cache("orders"));
        assert!(cache.is_secure());
        assert_eq!(assert_err(cache.configuration()), admin_only);
        assert_eq!(assert_err(cache.component_registry()), admin_only);
        assert_eq!(assert_err(cache.distribution_manager()), admin_only);
        match &cache {
            CacheRef::Secure(secure) => assert_eq!(assert_err(secure.delegate()), admin_only),
            CacheRef::Plain(_) => panic!("authorization is enabled"),
        }

        assert_eq!(
            assert_err(put(&cache, b"v")),
            GridError::permission_denied("rita", AuthorizationPermission::Write)
        );
        assert!(cache.get(b"k").is_ok());
        assert!(!Security::is_privileged());
    });
}

#[test]
fn restricted_subject_cannot_escalate_through_server() {
    let manager = secured_manager(&[("orders", repl())]);
    let server = Security::with_subject(reader(), || ProtocolServer::start(Arc::clone(&manager)))
        .unwrap();

    Security::with_subject(reader(), || {
        // Only resolved facts come back; the handles behind them stay inside.
        let policy = assert_ok(server.cache_policy("orders"));
        assert!(policy.segmented);

        assert_eq!(
            assert_err(server.put(
                "orders",
                Bytes::from_static(b"k"),
                Bytes::from_static(b"v"),
                None
            )),
            GridError::permission_denied("rita", AuthorizationPermission::Write)
        );
        assert!(matches!(
            server.add_client_listener("orders", Arc::new(|_: &CacheEvent| {})),
            Err(GridError::PermissionDenied { .. })
        ));

        // The server's own reads ran elevated, none of it leaked.
        assert!(!Security::is_privileged());
        assert!(manager.configuration().is_err());
    });
}

#[test]
fn anonymous_caller_is_denied() {
    let manager = secured_manager(&[("orders", repl())]);
    let server = ProtocolServer::start(Arc::clone(&manager)).unwrap();

    let anonymous = GridError::permission_denied("<anonymous>", AuthorizationPermission::Read);
    assert_eq!(assert_err(server.get("orders", b"k")), anonymous);
    let cache = manager.get_cache("orders").unwrap();
    assert_eq!(assert_err(cache.get(b"k")), anonymous);
    assert!(cache.add_listener(Arc::new(|_: &CacheEvent| {})).is_err());
}

#[tokio::test]
async fn client_listeners_can_only_be_removed_by_their_owner() {
    let manager = secured_manager(&[("orders", repl())]);
    let server = ProtocolServer::start(Arc::clone(&manager)).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    let id = Security::with_subject(application(), || {
        server.add_client_listener(
            "orders",
            Arc::new(move |_: &CacheEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
    })
    .unwrap();

    // Without LISTEN.
    let denied = Security::with_subject(reader(), || {
        server.remove_client_listener("orders", id)
    })
    .await;
    assert_eq!(
        denied.unwrap_err(),
        GridError::permission_denied("rita", AuthorizationPermission::Listen)
    );

    // With every permission, but not the owner.
    let foreign = Security::with_subject(admin(), || {
        server.remove_client_listener("orders", id)
    })
    .await;
    assert_eq!(
        foreign.unwrap_err(),
        GridError::ListenerNotOwned { id: id.as_u64() }
    );

    // Anonymous.
    assert!(server.remove_client_listener("orders", id).await.is_err());

    let cache = manager.get_cache("orders").unwrap();
    Security::with_subject(application(), || put(&cache, b"1")).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    Security::with_subject(application(), || server.remove_client_listener("orders", id))
        .await
        .unwrap();
    Security::with_subject(application(), || put(&cache, b"2")).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn manager_listeners_require_admin() {
    let manager = secured_manager(&[]);
    let events = Arc::new(Mutex::new(Vec::new()));

    let refused = Security::with_subject(reader(), || {
        manager.add_listener(Arc::new(|_: &ManagerEvent| {}))
    });
    assert!(matches!(refused, Err(GridError::PermissionDenied { .. })));

    let sink = Arc::clone(&events);
    Security::with_subject(admin(), || {
        manager
            .add_listener(Arc::new(move |event: &ManagerEvent| sink.lock().push(event.clone())))
            .unwrap();
        manager.define_cache("c", Configuration::default()).unwrap();
        manager.stop_cache("c").unwrap();
    });

    assert_eq!(
        *events.lock(),
        vec![
            ManagerEvent::CacheStarted {
                name: "c".to_string()
            },
            ManagerEvent::CacheStopped {
                name: "c".to_string()
            },
        ]
    );
}

#[test]
fn stopped_cache_is_not_handed_out() {
    let manager = secured_manager(&[("c", Configuration::default())]);
    Security::with_subject(admin(), || manager.stop_cache("c")).unwrap();

    assert_eq!(
        assert_err(manager.get_cache("c")),
        GridError::CacheNotRunning {
            name: "c".to_string()
        }
    );
}
