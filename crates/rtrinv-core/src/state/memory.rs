// # Memory Inventory Store
//
// In-memory implementation of InventoryStore.
//
// ## Purpose
//
// Provides a fast store that doesn't persist across restarts.
// Useful for testing and for deployments where the inventory is rebuilt
// from polling on every start.
//
// ## Crash Behavior
//
// - All rows are lost on restart/crash
// - First run after a restart creates every configured router again
// - Identities restart from 1

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::tables::InventoryTables;
use crate::Error;
use crate::model::{EntityKind, ManagedInterface, RecordId, Router, UserSnmpConfig};
use crate::traits::{InventoryStore, StoreFactory};

/// In-memory store implementation
///
/// Tables live behind a single RwLock. Clones share the same tables.
///
/// # Example
///
/// ```rust,no_run
/// use rtrinv_core::model::{EntityKind, Router};
/// use rtrinv_core::state::MemoryInventoryStore;
/// use rtrinv_core::traits::InventoryStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryInventoryStore::migrated().await;
///
///     let router = store.create_router(&Router::new("alu-01")).await?;
///     assert!(router.id.is_some());
///     assert_eq!(store.count(EntityKind::Router).await?, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryInventoryStore {
    inner: Arc<RwLock<InventoryTables>>,
}

impl MemoryInventoryStore {
    /// Create a new store with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store with every table already ensured
    pub async fn migrated() -> Self {
        let store = Self::new();
        {
            let mut guard = store.inner.write().await;
            for kind in EntityKind::ALL {
                guard.ensure_schema(kind);
            }
        }
        store
    }

    /// Drop every row and table
    pub async fn clear(&self) {
        *self.inner.write().await = InventoryTables::default();
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn ensure_schema(&self, kind: EntityKind) -> Result<(), Error> {
        if self.inner.write().await.ensure_schema(kind) {
            tracing::debug!("Created table {}", kind);
        }
        Ok(())
    }

    async fn count(&self, kind: EntityKind) -> Result<usize, Error> {
        self.inner.read().await.count(kind)
    }

    async fn find_routers_by_unique_name(&self, unique_name: &str) -> Result<Vec<Router>, Error> {
        self.inner.read().await.find_routers_by_unique_name(unique_name)
    }

    async fn list_routers(&self) -> Result<Vec<Router>, Error> {
        self.inner.read().await.list_routers()
    }

    async fn find_interfaces_by_router(&self, router_id: RecordId) -> Result<Vec<ManagedInterface>, Error> {
        self.inner.read().await.find_interfaces_by_router(router_id)
    }

    async fn find_snmp_configs_by_router(&self, router_id: RecordId) -> Result<Vec<UserSnmpConfig>, Error> {
        self.inner.read().await.find_snmp_configs_by_router(router_id)
    }

    async fn create_router(&self, router: &Router) -> Result<Router, Error> {
        self.inner.write().await.create_router(router, Utc::now())
    }

    async fn save_router(&self, router: &Router) -> Result<Router, Error> {
        self.inner.write().await.save_router(router, Utc::now())
    }

    async fn create_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface, Error> {
        self.inner.write().await.create_interface(interface, Utc::now())
    }

    async fn save_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface, Error> {
        self.inner.write().await.save_interface(interface, Utc::now())
    }

    async fn delete_interface(&self, interface: &ManagedInterface) -> Result<(), Error> {
        self.inner.write().await.delete_interface(interface)
    }

    async fn create_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig, Error> {
        self.inner.write().await.create_snmp_config(config, Utc::now())
    }

    async fn save_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig, Error> {
        self.inner.write().await.save_snmp_config(config, Utc::now())
    }

    async fn flush(&self) -> Result<(), Error> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}

/// Factory for [`MemoryInventoryStore`]; takes no configuration
pub struct MemoryInventoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryInventoryStoreFactory {
    async fn create(&self, _config: &serde_json::Value) -> Result<Box<dyn InventoryStore>, Error> {
        Ok(Box::new(MemoryInventoryStore::new()))
    }
}
