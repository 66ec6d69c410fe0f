//! Loading routers and their relations from the store
//!
//! Stores return bare router rows. These helpers materialize the interface
//! table and SNMP config on top of them.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{ManagedInterface, Router, UserSnmpConfig};
use crate::traits::InventoryStore;

/// Which relations to materialize when loading a router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub interfaces: bool,
    pub snmp: bool,
}

impl LoadOptions {
    /// Columns only
    pub const BARE: LoadOptions = LoadOptions {
        interfaces: false,
        snmp: false,
    };

    /// Columns, interfaces and SNMP config
    pub const FULL: LoadOptions = LoadOptions {
        interfaces: true,
        snmp: true,
    };
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::FULL
    }
}

/// Fetch exactly one router by natural key
pub async fn load_router(store: &dyn InventoryStore, unique_name: &str, opts: LoadOptions) -> Result<Router> {
    let mut rows = store.find_routers_by_unique_name(unique_name).await?;
    if rows.len() != 1 {
        return Err(Error::consistency(unique_name, rows.len()));
    }
    let mut router = rows.remove(0);
    materialize(store, &mut router, opts).await?;
    Ok(router)
}

/// Fetch every stored router
pub async fn load_routers(store: &dyn InventoryStore, opts: LoadOptions) -> Result<Vec<Router>> {
    let mut routers = store.list_routers().await?;
    for router in routers.iter_mut() {
        materialize(store, router, opts).await?;
    }
    debug!("Loaded {} router(s) from store", routers.len());
    Ok(routers)
}

/// Stored interfaces of a persisted router
pub async fn load_interfaces(store: &dyn InventoryStore, router: &Router) -> Result<Vec<ManagedInterface>> {
    let id = router.id.ok_or_else(|| {
        Error::missing_identity(format!("cannot load interfaces of unsaved router {}", router.unique_name))
    })?;
    store.find_interfaces_by_router(id).await
}

/// Stored SNMP config of a persisted router, if any
pub async fn load_snmp_config(store: &dyn InventoryStore, router: &Router) -> Result<Option<UserSnmpConfig>> {
    let id = router.id.ok_or_else(|| {
        Error::missing_identity(format!("cannot load SNMP config of unsaved router {}", router.unique_name))
    })?;
    let mut configs = store.find_snmp_configs_by_router(id).await?;
    match configs.len() {
        0 | 1 => Ok(configs.pop()),
        n => Err(Error::consistency(router.unique_name.clone(), n)),
    }
}

async fn materialize(store: &dyn InventoryStore, router: &mut Router, opts: LoadOptions) -> Result<()> {
    if opts.interfaces {
        router.interfaces = load_interfaces(store, router).await?;
    }
    if opts.snmp {
        router.snmp = load_snmp_config(store, router).await?;
    }
    Ok(())
}
