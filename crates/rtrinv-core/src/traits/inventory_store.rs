// # Inventory Store Trait
//
// Defines the interface to the persistence engine.
//
// ## Purpose
//
// The store owns the durable copy of routers, interfaces and SNMP configs.
// The core reaches it only through this trait:
// - Unique-key lookups of routers (0 or 1 row for a healthy store)
// - Foreign-key lookups of interfaces and SNMP configs
// - Create / save / delete, with the store assigning identity and timestamps
//
// ## Implementations
//
// - In-memory: `MemoryInventoryStore`
// - JSON file: `FileInventoryStore`
// - Future: SQL backends
//
// ## Usage
//
// ```rust,ignore
// use rtrinv_core::{InventoryStore, Router};
// use rtrinv_core::model::EntityKind;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* InventoryStore implementation */;
//
//     for kind in EntityKind::ALL {
//         store.ensure_schema(kind).await?;
//     }
//
//     let created = store.create_router(&Router::new("alu-01")).await?;
//     assert!(created.id.is_some());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{EntityKind, ManagedInterface, RecordId, Router, UserSnmpConfig};

/// Trait for persistence engine implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - `ensure_schema()` is idempotent and is called once per entity kind at
///   startup. Every other operation on a kind whose schema was never ensured
///   fails with [`crate::Error::Store`].
/// - Identity is assigned by `create_*` and never changed afterward.
///   `created_at` is set on create; `updated_at` on create and every save.
/// - Routers are returned as bare rows: `interfaces` empty and `snmp` unset.
///   Use the foreign-key lookups (or [`crate::load`]) to materialize them.
/// - `find_routers_by_unique_name()` returns every matching row. More than
///   one row is a broken invariant the caller reports, not something the
///   store hides.
///
/// # Transactions
///
/// Each call is its own unit of work. Callers that need a diff applied
/// atomically must wrap it in a store-level transaction.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Create the table for `kind` if it does not exist
    async fn ensure_schema(&self, kind: EntityKind) -> Result<(), crate::Error>;

    /// Number of rows of `kind`
    async fn count(&self, kind: EntityKind) -> Result<usize, crate::Error>;

    /// Every router row whose natural key is `unique_name`
    async fn find_routers_by_unique_name(&self, unique_name: &str) -> Result<Vec<Router>, crate::Error>;

    /// Every router row, in identity order
    async fn list_routers(&self) -> Result<Vec<Router>, crate::Error>;

    /// Interfaces belonging to `router_id`, in identity order
    async fn find_interfaces_by_router(
        &self,
        router_id: RecordId,
    ) -> Result<Vec<ManagedInterface>, crate::Error>;

    /// SNMP configs belonging to `router_id`
    async fn find_snmp_configs_by_router(
        &self,
        router_id: RecordId,
    ) -> Result<Vec<UserSnmpConfig>, crate::Error>;

    /// Persist a new router
    ///
    /// Cascades to `router.interfaces` and `router.snmp`. The returned router
    /// carries the assigned identities on itself and on its children.
    async fn create_router(&self, router: &Router) -> Result<Router, crate::Error>;

    /// Update the columns of an existing router, by identity
    async fn save_router(&self, router: &Router) -> Result<Router, crate::Error>;

    /// Persist a new interface; `router_id` must be set
    async fn create_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface, crate::Error>;

    /// Update an existing interface, by identity
    async fn save_interface(&self, interface: &ManagedInterface) -> Result<ManagedInterface, crate::Error>;

    /// Delete an existing interface, by identity
    async fn delete_interface(&self, interface: &ManagedInterface) -> Result<(), crate::Error>;

    /// Persist the SNMP config of a router; fails if one already exists
    async fn create_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig, crate::Error>;

    /// Update an existing SNMP config, by identity
    async fn save_snmp_config(&self, config: &UserSnmpConfig) -> Result<UserSnmpConfig, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing stores from configuration
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Create a store instance from its JSON configuration
    async fn create(&self, config: &serde_json::Value) -> Result<Box<dyn InventoryStore>, crate::Error>;
}
