//! Contract Test: Bootstrap & Router Synchronization
//!
//! This test verifies how configured routers meet the store at startup.
//!
//! Constraints verified:
//! - An empty store gets every router created, with identities assigned
//! - A known router is pulled from storage (or pushed, per policy)
//! - A router whose configuration did not change is left alone
//! - Divergent SNMP settings are resolved by the same policy
//! - A router missing from a non-empty store is created on its own
//! - Two rows for one unique name is a fatal consistency error
//! - Identities survive a restart on the file store
//!
//! If this test fails, routers will be duplicated or lose their identity.

mod common;

use common::*;
use rtrinv_core::engine::{BootstrapOutcome, EngineEvent};
use rtrinv_core::model::{EntityKind, UserSnmpConfig};
use rtrinv_core::state::FileInventoryStore;
use rtrinv_core::traits::InventoryStore;
use rtrinv_core::{
    Error, InterfaceConfig, InventoryConfig, InventoryEngine, Router, RouterConfig, RouterMetadataPolicy,
};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

async fn bootstrap(store: &RecordingStore, config: InventoryConfig) -> (rtrinv_core::sync::BootstrapReport, Router) {
    let (engine, _events) =
        InventoryEngine::new(Arc::new(store.clone()), Arc::new(ScriptedPoller::new()), config).unwrap();
    let report = engine.bootstrap().await.unwrap();
    (report, engine.routers().await.remove(0))
}

#[tokio::test]
async fn empty_store_creates_every_router() {
    let store = RecordingStore::new();
    let mut config = minimal_config(&["alu-01", "alu-02"]);
    config.routers[0] = RouterConfig::new("alu-01")
        .with_interface(InterfaceConfig::new("1/1/1", 1))
        .with_interface(InterfaceConfig::new("1/1/2", 2));

    let (engine, mut events) =
        InventoryEngine::new(Arc::new(store.clone()), Arc::new(ScriptedPoller::new()), config).unwrap();
    let report = assert_ok!(engine.bootstrap().await);

    assert_eq!(report.created, vec!["alu-01".to_string(), "alu-02".to_string()]);
    assert_eq!(store.count(EntityKind::Router).await.unwrap(), 2);
    assert_eq!(store.count(EntityKind::Interface).await.unwrap(), 2);

    let routers = engine.routers().await;
    assert!(routers.iter().all(|r| r.id.is_some() && r.created_at.is_some()));
    assert_ne!(routers[0].id, routers[1].id);
    assert!(routers[0].interfaces.iter().all(|i| i.id.is_some() && i.router_id == routers[0].id));

    for name in ["alu-01", "alu-02"] {
        assert_eq!(
            events.recv().await,
            Some(EngineEvent::RouterBootstrapped {
                unique_name: name.to_string(),
                outcome: BootstrapOutcome::Created,
            })
        );
    }
}

#[tokio::test]
async fn known_router_is_pulled_from_storage() {
    let store = RecordingStore::new();

    let mut first = minimal_config(&["alu-01"]);
    first.routers[0].location = "paris".to_string();
    let (engine, _events) =
        InventoryEngine::new(Arc::new(store.clone()), Arc::new(ScriptedPoller::new()), first).unwrap();
    engine.bootstrap().await.unwrap();
    let stored_id = engine.routers().await[0].id;

    let mut second = minimal_config(&["alu-01"]);
    second.routers[0].location = "lyon".to_string();
    let (engine, _events) =
        InventoryEngine::new(Arc::new(store.clone()), Arc::new(ScriptedPoller::new()), second).unwrap();
    let report = engine.bootstrap().await.unwrap();

    assert_eq!(report.pulled, vec!["alu-01".to_string()]);
    let router = &engine.routers().await[0];
    assert_eq!(router.id, stored_id);
    assert_eq!(router.location, "paris");
    assert_eq!(store.router_writes(), 1);
}

#[tokio::test]
async fn push_policy_saves_local_metadata() {
    let store = RecordingStore::new();

    let (engine, _events) = InventoryEngine::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedPoller::new()),
        minimal_config(&["alu-01"]),
    )
    .unwrap();
    engine.bootstrap().await.unwrap();
    let stored = engine.routers().await.remove(0);

    let mut config = minimal_config(&["alu-01"]);
    config.routers[0].contact = "noc@example.net".to_string();
    config.engine.router_metadata_policy = RouterMetadataPolicy::PushLocal;
    let (engine, _events) =
        InventoryEngine::new(Arc::new(store.clone()), Arc::new(ScriptedPoller::new()), config).unwrap();
    let report = engine.bootstrap().await.unwrap();

    assert_eq!(report.pushed, vec!["alu-01".to_string()]);
    let router = engine.routers().await.remove(0);
    assert_eq!(router.id, stored.id);
    assert_eq!(router.created_at, stored.created_at);
    assert_eq!(router.contact, "noc@example.net");

    let rows = store.find_routers_by_unique_name("alu-01").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].contact, "noc@example.net");
}

#[tokio::test]
async fn identical_restart_is_unchanged_under_both_policies() {
    for policy in [RouterMetadataPolicy::PullFromStore, RouterMetadataPolicy::PushLocal] {
        let store = RecordingStore::new();
        let mut config = minimal_config(&["alu-01"]);
        config.routers[0].location = "paris".to_string();
        config.engine.router_metadata_policy = policy;

        let (_, first) = bootstrap(&store, config.clone()).await;
        let writes = store.router_writes();

        let (report, second) = bootstrap(&store, config).await;

        assert_eq!(report.unchanged, vec!["alu-01".to_string()], "{policy:?}");
        assert!(report.pulled.is_empty() && report.pushed.is_empty(), "{policy:?}");
        assert_eq!(store.router_writes(), writes, "{policy:?}");
        assert_eq!(second.id, first.id);
        assert_eq!(second.updated_at, first.updated_at);
    }
}

#[tokio::test]
async fn divergent_snmp_config_is_pulled_from_storage() {
    let store = RecordingStore::new();
    let mut config = minimal_config(&["alu-01"]);
    config.routers[0].snmp = Some(UserSnmpConfig::v2c("10.0.1.1:161", "public"));
    let (_, first) = bootstrap(&store, config.clone()).await;
    let stored = first.snmp.unwrap();

    let mut edited = UserSnmpConfig::v2c("10.0.1.1:161", "private");
    edited.timeout_secs = stored.timeout_secs + 5;
    config.routers[0].snmp = Some(edited);
    let (_, second) = bootstrap(&store, config).await;

    let snmp = second.snmp.unwrap();
    assert_eq!(snmp, stored);

    let rows = store.find_snmp_configs_by_router(second.id.unwrap()).await.unwrap();
    assert_eq!(rows, vec![stored]);
}

#[tokio::test]
async fn divergent_snmp_config_is_pushed_in_place() {
    let store = RecordingStore::new();
    let mut config = minimal_config(&["alu-01"]);
    config.engine.router_metadata_policy = RouterMetadataPolicy::PushLocal;
    config.routers[0].snmp = Some(UserSnmpConfig::v2c("10.0.1.1:161", "public"));
    let (_, first) = bootstrap(&store, config.clone()).await;
    let stored = first.snmp.unwrap();

    let mut edited = UserSnmpConfig::v2c("10.0.1.1:161", "private");
    edited.timeout_secs = stored.timeout_secs + 5;
    config.routers[0].snmp = Some(edited.clone());
    let (_, second) = bootstrap(&store, config).await;

    let snmp = second.snmp.unwrap();
    assert_eq!(snmp.id, stored.id);
    assert_eq!(snmp.created_at, stored.created_at);
    assert_eq!(snmp.credentials, edited.credentials);
    assert_eq!(snmp.timeout_secs, edited.timeout_secs);

    assert_eq!(store.count(EntityKind::SnmpConfig).await.unwrap(), 1);
    let rows = store.find_snmp_configs_by_router(second.id.unwrap()).await.unwrap();
    assert_eq!(rows, vec![snmp]);
}

#[tokio::test]
async fn new_router_in_non_empty_store_is_created() {
    let store = RecordingStore::new();

    let (engine, _events) = InventoryEngine::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedPoller::new()),
        minimal_config(&["alu-01"]),
    )
    .unwrap();
    engine.bootstrap().await.unwrap();

    let (engine, _events) = InventoryEngine::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedPoller::new()),
        minimal_config(&["alu-01", "alu-02"]),
    )
    .unwrap();
    let report = engine.bootstrap().await.unwrap();

    assert_eq!(report.created, vec!["alu-02".to_string()]);
    assert_eq!(store.count(EntityKind::Router).await.unwrap(), 2);
}

#[tokio::test]
async fn duplicated_router_rows_are_a_consistency_error() {
    let store = RecordingStore::new();

    let (engine, _events) = InventoryEngine::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedPoller::new()),
        minimal_config(&["alu-01"]),
    )
    .unwrap();
    engine.bootstrap().await.unwrap();

    store.duplicate_router("alu-01");
    let (engine, _events) = InventoryEngine::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedPoller::new()),
        minimal_config(&["alu-01"]),
    )
    .unwrap();

    let err = assert_err!(engine.bootstrap().await);
    assert!(err.is_fatal());
    match err {
        Error::Consistency { unique_name, found } => {
            assert_eq!(unique_name, "alu-01");
            assert_eq!(found, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn snmp_config_is_created_once() {
    let store = RecordingStore::new();
    let mut config = minimal_config(&["alu-01"]);
    config.routers[0].snmp = Some(UserSnmpConfig::v2c("10.0.1.1:161", "public"));

    for _ in 0..2 {
        let (engine, _events) =
            InventoryEngine::new(Arc::new(store.clone()), Arc::new(ScriptedPoller::new()), config.clone())
                .unwrap();
        engine.bootstrap().await.unwrap();

        let snmp = engine.routers().await.remove(0).snmp.unwrap();
        assert!(snmp.id.is_some());
    }

    assert_eq!(store.count(EntityKind::SnmpConfig).await.unwrap(), 1);
}

#[tokio::test]
async fn identities_survive_restart_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    let mut config = minimal_config(&["alu-01"]);
    config.routers[0] = RouterConfig::new("alu-01").with_interface(InterfaceConfig::new("1/1/1", 1));

    let (router_id, interface_id) = {
        let store = Arc::new(FileInventoryStore::new(&path).await.unwrap());
        let (engine, _events) =
            InventoryEngine::new(store.clone(), Arc::new(ScriptedPoller::new()), config.clone()).unwrap();
        engine.bootstrap().await.unwrap();
        store.flush().await.unwrap();

        let router = engine.routers().await.remove(0);
        (router.id, router.interfaces[0].id)
    };

    let store = Arc::new(FileInventoryStore::new(&path).await.unwrap());
    let (engine, _events) = InventoryEngine::new(store, Arc::new(ScriptedPoller::new()), config).unwrap();
    let report = engine.bootstrap().await.unwrap();

    assert!(report.created.is_empty());
    let router = engine.routers().await.remove(0);
    assert_eq!(router.id, router_id);
    assert_eq!(router.interfaces.len(), 1);
    assert_eq!(router.interfaces[0].id, interface_id);
}
