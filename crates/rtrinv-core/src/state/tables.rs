// # Inventory Tables
//
// Table storage shared by the memory and file stores.
//
// Plays the role of the relational engine: per-kind tables, identity
// sequences, the unique constraint on `unique_name`, foreign keys from
// interfaces and SNMP configs to routers, and cascading router creation.
// Callers provide locking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::Error;
use crate::model::{EntityKind, ManagedInterface, RecordId, Router, UserSnmpConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    routers: u64,
    interfaces: u64,
    snmp_configs: u64,
}

impl Sequences {
    fn next(&mut self, kind: EntityKind) -> RecordId {
        let seq = match kind {
            EntityKind::Router => &mut self.routers,
            EntityKind::Interface => &mut self.interfaces,
            EntityKind::SnmpConfig => &mut self.snmp_configs,
        };
        *seq += 1;
        RecordId(*seq)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct InventoryTables {
    #[serde(default)]
    schemas: BTreeSet<EntityKind>,
    #[serde(default)]
    sequences: Sequences,
    #[serde(default)]
    routers: BTreeMap<RecordId, Router>,
    #[serde(default)]
    interfaces: BTreeMap<RecordId, ManagedInterface>,
    #[serde(default)]
    snmp_configs: BTreeMap<RecordId, UserSnmpConfig>,
}

impl InventoryTables {
    /// Returns true when the table was created by this call
    pub(crate) fn ensure_schema(&mut self, kind: EntityKind) -> bool {
        self.schemas.insert(kind)
    }

    fn require(&self, kind: EntityKind) -> Result<(), Error> {
        if self.schemas.contains(&kind) {
            Ok(())
        } else {
            Err(Error::store(format!("relation \"{}\" does not exist", kind)))
        }
    }

    pub(crate) fn count(&self, kind: EntityKind) -> Result<usize, Error> {
        self.require(kind)?;
        Ok(match kind {
            EntityKind::Router => self.routers.len(),
            EntityKind::Interface => self.interfaces.len(),
            EntityKind::SnmpConfig => self.snmp_configs.len(),
        })
    }

    pub(crate) fn find_routers_by_unique_name(&self, unique_name: &str) -> Result<Vec<Router>, Error> {
        self.require(EntityKind::Router)?;
        Ok(self
            .routers
            .values()
            .filter(|r| r.unique_name == unique_name)
            .cloned()
            .collect())
    }

    pub(crate) fn list_routers(&self) -> Result<Vec<Router>, Error> {
        self.require(EntityKind::Router)?;
        Ok(self.routers.values().cloned().collect())
    }

    pub(crate) fn find_interfaces_by_router(&self, router_id: RecordId) -> Result<Vec<ManagedInterface>, Error> {
        self.require(EntityKind::Interface)?;
        Ok(self
            .interfaces
            .values()
            .filter(|i| i.router_id == Some(router_id))
            .cloned()
            .collect())
    }

    pub(crate) fn find_snmp_configs_by_router(&self, router_id: RecordId) -> Result<Vec<UserSnmpConfig>, Error> {
        self.require(EntityKind::SnmpConfig)?;
        Ok(self
            .snmp_configs
            .values()
            .filter(|c| c.router_id == Some(router_id))
            .cloned()
            .collect())
    }

    pub(crate) fn create_router(&mut self, router: &Router, now: DateTime<Utc>) -> Result<Router, Error> {
        self.require(EntityKind::Router)?;
        if !router.interfaces.is_empty() {
            self.require(EntityKind::Interface)?;
        }
        if router.snmp.is_some() {
            self.require(EntityKind::SnmpConfig)?;
        }
        if let Some(id) = router.id {
            return Err(Error::store(format!(
                "router {} already persisted as {}",
                router.unique_name, id
            )));
        }
        if self.routers.values().any(|r| r.unique_name == router.unique_name) {
            return Err(Error::store(format!(
                "duplicate key value violates unique constraint: unique_name={}",
                router.unique_name
            )));
        }
        Self::check_interface_keys(&router.interfaces)?;

        let id = self.sequences.next(EntityKind::Router);
        let mut row = router.columns();
        row.id = Some(id);
        row.created_at = Some(now);
        row.updated_at = Some(now);
        self.routers.insert(id, row.clone());

        let mut created = row;
        for interface in &router.interfaces {
            let mut child = interface.clone();
            child.router_id = Some(id);
            let mut persisted = self.insert_interface(&child, now);
            persisted.counters = interface.counters;
            created.interfaces.push(persisted);
        }
        if let Some(snmp) = &router.snmp {
            let mut child = snmp.clone();
            child.router_id = Some(id);
            created.snmp = Some(self.insert_snmp_config(&child, now));
        }

        Ok(created)
    }

    pub(crate) fn save_router(&mut self, router: &Router, now: DateTime<Utc>) -> Result<Router, Error> {
        self.require(EntityKind::Router)?;
        let id = router
            .id
            .ok_or_else(|| Error::missing_identity(format!("router {} was never persisted", router.unique_name)))?;
        let created_at = self
            .routers
            .get(&id)
            .ok_or_else(|| Error::store(format!("router {} does not exist", id)))?
            .created_at;
        if self
            .routers
            .values()
            .any(|r| r.id != Some(id) && r.unique_name == router.unique_name)
        {
            return Err(Error::store(format!(
                "duplicate key value violates unique constraint: unique_name={}",
                router.unique_name
            )));
        }

        let mut row = router.columns();
        row.created_at = created_at;
        row.updated_at = Some(now);
        self.routers.insert(id, row.clone());
        Ok(row)
    }

    pub(crate) fn create_interface(
        &mut self,
        interface: &ManagedInterface,
        now: DateTime<Utc>,
    ) -> Result<ManagedInterface, Error> {
        self.require(EntityKind::Interface)?;
        if let Some(id) = interface.id {
            return Err(Error::store(format!("interface {} already persisted as {}", interface, id)));
        }
        let router_id = self.require_router(interface.router_id, interface)?;
        if self.interfaces.values().any(|i| {
            i.router_id == Some(router_id) && i.name == interface.name && i.index == interface.index
        }) {
            return Err(Error::store(format!(
                "duplicate key value violates unique constraint: router={} interface={}",
                router_id, interface
            )));
        }
        Ok(self.insert_interface(interface, now))
    }

    pub(crate) fn save_interface(
        &mut self,
        interface: &ManagedInterface,
        now: DateTime<Utc>,
    ) -> Result<ManagedInterface, Error> {
        self.require(EntityKind::Interface)?;
        let id = interface
            .id
            .ok_or_else(|| Error::missing_identity(format!("interface {} was never persisted", interface)))?;
        let created_at = self
            .interfaces
            .get(&id)
            .ok_or_else(|| Error::store(format!("interface {} does not exist", id)))?
            .created_at;
        self.require_router(interface.router_id, interface)?;

        let mut row = interface.columns();
        row.created_at = created_at;
        row.updated_at = Some(now);
        self.interfaces.insert(id, row.clone());
        Ok(row)
    }

    /// Deleting a row that is already gone is not an error
    pub(crate) fn delete_interface(&mut self, interface: &ManagedInterface) -> Result<(), Error> {
        self.require(EntityKind::Interface)?;
        let id = interface
            .id
            .ok_or_else(|| Error::missing_identity(format!("interface {} was never persisted", interface)))?;
        self.interfaces.remove(&id);
        Ok(())
    }

    pub(crate) fn create_snmp_config(
        &mut self,
        config: &UserSnmpConfig,
        now: DateTime<Utc>,
    ) -> Result<UserSnmpConfig, Error> {
        self.require(EntityKind::SnmpConfig)?;
        if config.id.is_some() {
            return Err(Error::store("SNMP config already persisted"));
        }
        let router_id = config
            .router_id
            .ok_or_else(|| Error::missing_identity("SNMP config has no router"))?;
        if !self.routers.contains_key(&router_id) {
            return Err(Error::store(format!("router {} does not exist", router_id)));
        }
        if self.snmp_configs.values().any(|c| c.router_id == Some(router_id)) {
            return Err(Error::store(format!("router {} already has an SNMP config", router_id)));
        }
        Ok(self.insert_snmp_config(config, now))
    }

    pub(crate) fn save_snmp_config(
        &mut self,
        config: &UserSnmpConfig,
        now: DateTime<Utc>,
    ) -> Result<UserSnmpConfig, Error> {
        self.require(EntityKind::SnmpConfig)?;
        let id = config
            .id
            .ok_or_else(|| Error::missing_identity("SNMP config was never persisted"))?;
        let created_at = self
            .snmp_configs
            .get(&id)
            .ok_or_else(|| Error::store(format!("SNMP config {} does not exist", id)))?
            .created_at;
        let router_id = config
            .router_id
            .ok_or_else(|| Error::missing_identity("SNMP config has no router"))?;
        if !self.routers.contains_key(&router_id) {
            return Err(Error::store(format!("router {} does not exist", router_id)));
        }
        if self
            .snmp_configs
            .iter()
            .any(|(other, c)| *other != id && c.router_id == Some(router_id))
        {
            return Err(Error::store(format!("router {} already has an SNMP config", router_id)));
        }

        let mut row = config.clone();
        row.created_at = created_at;
        row.updated_at = Some(now);
        self.snmp_configs.insert(id, row.clone());
        Ok(row)
    }

    fn require_router(&self, router_id: Option<RecordId>, interface: &ManagedInterface) -> Result<RecordId, Error> {
        let router_id =
            router_id.ok_or_else(|| Error::missing_identity(format!("interface {} has no router", interface)))?;
        if self.routers.contains_key(&router_id) {
            Ok(router_id)
        } else {
            Err(Error::store(format!("router {} does not exist", router_id)))
        }
    }

    fn check_interface_keys(interfaces: &[ManagedInterface]) -> Result<(), Error> {
        for (i, a) in interfaces.iter().enumerate() {
            if interfaces[..i].iter().any(|b| a.name == b.name && a.index == b.index) {
                return Err(Error::store(format!(
                    "duplicate key value violates unique constraint: interface={}",
                    a
                )));
            }
        }
        Ok(())
    }

    fn insert_interface(&mut self, interface: &ManagedInterface, now: DateTime<Utc>) -> ManagedInterface {
        let id = self.sequences.next(EntityKind::Interface);
        let mut row = interface.columns();
        row.id = Some(id);
        row.created_at = Some(now);
        row.updated_at = Some(now);
        self.interfaces.insert(id, row.clone());
        row
    }

    fn insert_snmp_config(&mut self, config: &UserSnmpConfig, now: DateTime<Utc>) -> UserSnmpConfig {
        let id = self.sequences.next(EntityKind::SnmpConfig);
        let mut row = config.clone();
        row.id = Some(id);
        row.created_at = Some(now);
        row.updated_at = Some(now);
        self.snmp_configs.insert(id, row.clone());
        row
    }
}
