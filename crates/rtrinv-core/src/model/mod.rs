//! Inventory data model
//!
//! - [`Router`]: a managed router, keyed by its `unique_name`
//! - [`ManagedInterface`]: one row of a router's interface table
//! - [`UserSnmpConfig`]: per-router SNMP transport and credentials
//! - [`CounterHistory`]: transient traffic counters used for rate computation

pub mod counters;
pub mod interface;
pub mod router;
pub mod snmp;

pub use counters::{CounterHistory, IfCounters, IfRates};
pub use interface::ManagedInterface;
pub use router::Router;
pub use snmp::{AuthProtocol, PrivProtocol, SecurityLevel, SnmpCredentials, UserSnmpConfig};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage-assigned identity
///
/// Opaque to everything except the store that produced it. Assigned once,
/// on first persistence, and never changed afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity types known to the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Router,
    Interface,
    SnmpConfig,
}

impl EntityKind {
    /// Every entity kind, in schema creation order
    pub const ALL: [EntityKind; 3] = [EntityKind::Router, EntityKind::Interface, EntityKind::SnmpConfig];

    /// Table name used by stores
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Router => "managed_routers",
            EntityKind::Interface => "managed_interfaces",
            EntityKind::SnmpConfig => "user_snmp_configs",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
