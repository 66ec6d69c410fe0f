//! Test doubles and common utilities for contract tests
//!
//! The store double wraps the in-memory store so behavior stays realistic,
//! while counting calls and injecting the failures the contracts care about.

#![allow(dead_code)]

use rtrinv_core::error::{Error, Result};
use rtrinv_core::model::{EntityKind, ManagedInterface, RecordId, Router, UserSnmpConfig};
use rtrinv_core::state::MemoryInventoryStore;
use rtrinv_core::traits::{InterfacePoller, InventoryStore};
use rtrinv_core::{InventoryConfig, RouterConfig};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Interface with the given natural key and speed, not persisted
pub fn iface(name: &str, index: i32, speed: u64) -> ManagedInterface {
    ManagedInterface::new(name, index).with_speed(speed)
}

/// A store that counts writes and can be told to misbehave
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: MemoryInventoryStore,
    interface_writes: Arc<AtomicUsize>,
    router_writes: Arc<AtomicUsize>,
    flush_count: Arc<AtomicUsize>,
    failing_interfaces: Arc<Mutex<HashSet<String>>>,
    duplicated_routers: Arc<Mutex<HashSet<String>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying store, for inspecting rows directly
    pub fn inner(&self) -> &MemoryInventoryStore {
        &self.inner
    }

    /// Number of create/save/delete calls on interfaces
    pub fn interface_writes(&self) -> usize {
        self.interface_writes.load(Ordering::SeqCst)
    }

    /// Number of create/save calls on routers
    pub fn router_writes(&self) -> usize {
        self.router_writes.load(Ordering::SeqCst)
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }

    /// Every write touching an interface named `name` fails
    pub fn fail_interface(&self, name: &str) {
        self.failing_interfaces.lock().unwrap().insert(name.to_string());
    }

    /// Unique-name lookups of `unique_name` return the row twice
    pub fn duplicate_router(&self, unique_name: &str) {
        self.duplicated_routers.lock().unwrap().insert(unique_name.to_string());
    }

    fn check_interface(&self, interface: &ManagedInterface) -> Result<()> {
        self.interface_writes.fetch_add(1, Ordering::SeqCst);
        if self.failing_interfaces.lock().unwrap().contains(&interface.name) {
            return Err(Error::store(format!("injected failure for {}", interface.name)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryStore for RecordingStore {
    async fn ensure_schema(&self, kind: EntityKind) -> Result<()> {
        self.inner.ensure_schema(kind).await
    }

    async fn count(&self, kind: EntityKind) -> Result<usize> {
        self.inner.count(kind).await
    }

    async fn find_routers_by_unique_name(&self, unique_name: &str) -> Result<Vec<Router>> {
        let mut rows = self.inner.find_routers_by_unique_name(unique_name).await?;
        if self.duplicated_routers.lock().unwrap().contains(unique_name) {
            if let Some(row) = rows.first().cloned() {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    async fn list_routers(&self) -> Result<Vec<Router>> {
        self.inner.list_routers().await
    }

    async fn find_interfaces_by_router(&self, router_id: RecordId) -> Result<Vec<ManagedInterface>> {
        self.inner.find_interfaces_by_router(router_id).await
    }

    async fn find_snmp_configs_by_router(&self, router_id: RecordId) -> Result<Vec<UserSnmpConfig>> {
        self.inner.find_snmp_configs_by_router(router_id).await
    }

    async fn create_router(&self, router: &Router) -> Result<Router> {
        self.router_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create_router(router).await
    }

    async fn save_router(&self, router: &Router) -> Result<Router> {
        self.router_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_router(router).await
    }

    async fn create_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface> {
        self.check_interface(interface)?;
        self.inner.create_interface(interface).await
    }

    async fn save_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface> {
        self.check_interface(interface)?;
        self.inner.save_interface(interface).await
    }

    async fn delete_interface(&self, interface: &ManagedInterface) -> Result<()> {
        self.check_interface(interface)?;
        self.inner.delete_interface(interface).await
    }

    async fn create_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig> {
        self.inner.create_snmp_config(config).await
    }

    async fn save_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig> {
        self.inner.save_snmp_config(config).await
    }

    async fn flush(&self) -> Result<()> {
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        self.inner.flush().await
    }
}

/// A poller serving scripted tables and counting calls
///
/// Each router has a queue of tables. A poll pops the next one; the last
/// table keeps being served once the queue is down to one entry.
#[derive(Clone, Default)]
pub struct ScriptedPoller {
    scripts: Arc<Mutex<HashMap<String, Vec<Vec<ManagedInterface>>>>>,
    poll_count: Arc<AtomicUsize>,
}

impl ScriptedPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table to the queue of `unique_name`
    pub fn push_table(&self, unique_name: &str, table: Vec<ManagedInterface>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(unique_name.to_string())
            .or_default()
            .push(table);
    }

    pub fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InterfacePoller for ScriptedPoller {
    async fn poll(&self, router: &Router) -> Result<Vec<ManagedInterface>> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(&router.unique_name)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::poll(format!("device {} unreachable", router.unique_name)))?;
        if queue.len() > 1 {
            Ok(queue.remove(0))
        } else {
            Ok(queue[0].clone())
        }
    }

    fn poller_name(&self) -> &'static str {
        "scripted"
    }
}

/// A poller that sleeps before answering, to catch shutdown mid-cycle
pub struct SlowPoller {
    pub delay: Duration,
    pub table: Vec<ManagedInterface>,
    pub poll_count: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl InterfacePoller for SlowPoller {
    async fn poll(&self, _router: &Router) -> Result<Vec<ManagedInterface>> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.table.clone())
    }

    fn poller_name(&self) -> &'static str {
        "slow"
    }
}

/// Helper to create a minimal InventoryConfig for testing
pub fn minimal_config(unique_names: &[&str]) -> InventoryConfig {
    let mut config = InventoryConfig::new();
    config.engine.event_channel_capacity = 100;
    config.engine.default_polling_interval_secs = 3600;
    for name in unique_names {
        config.routers.push(RouterConfig::new(*name));
    }
    config
}
