//! Managed router record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::{ManagedInterface, RecordId, UserSnmpConfig};

/// A router under management
///
/// `unique_name` is the natural key: stable, assigned externally and never
/// regenerated. `id`, `created_at` and `updated_at` belong to the store and
/// are `None` until the router is first persisted.
///
/// The router exclusively owns its interface collection and SNMP config in
/// memory; stores keep them in their own tables and only materialize them
/// on request (see [`crate::load`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Router {
    /// Storage-assigned identity
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Storage-assigned creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Storage-assigned last update time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Natural key
    pub unique_name: String,
    /// Display name (sysName)
    #[serde(default)]
    pub name: String,
    /// sysDescr
    #[serde(default)]
    pub description: String,
    /// sysUpTime as reported by the device
    #[serde(default)]
    pub up_time: String,
    /// sysContact
    #[serde(default)]
    pub contact: String,
    /// sysLocation
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    /// max-repetitions used for GETBULK requests
    #[serde(default)]
    pub bulk_max_repetitions: u32,
    /// Source address of flow export packets sent by this router
    #[serde(default)]
    pub flow_source_ip: Option<IpAddr>,
    /// Per-router polling interval; 0 means the engine default
    #[serde(default)]
    pub polling_interval_secs: u64,

    /// Interface table (not a persisted column)
    #[serde(default)]
    pub interfaces: Vec<ManagedInterface>,
    /// SNMP settings (not a persisted column)
    #[serde(default)]
    pub snmp: Option<UserSnmpConfig>,
}

impl Router {
    /// Create a router with only its natural key set
    pub fn new(unique_name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            ..Default::default()
        }
    }

    /// Whether the store has assigned an identity yet
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Copy every persisted column of `other` into `self`
    ///
    /// Interfaces and SNMP config are left untouched.
    pub fn copy_columns_from(&mut self, other: &Router) {
        self.id = other.id;
        self.created_at = other.created_at;
        self.updated_at = other.updated_at;
        self.copy_attributes_from(other);
    }

    /// Copy the non-identity scalar attributes of `other` into `self`
    pub fn copy_attributes_from(&mut self, other: &Router) {
        self.unique_name.clone_from(&other.unique_name);
        self.name.clone_from(&other.name);
        self.description.clone_from(&other.description);
        self.up_time.clone_from(&other.up_time);
        self.contact.clone_from(&other.contact);
        self.location.clone_from(&other.location);
        self.lat = other.lat;
        self.lon = other.lon;
        self.bulk_max_repetitions = other.bulk_max_repetitions;
        self.flow_source_ip = other.flow_source_ip;
        self.polling_interval_secs = other.polling_interval_secs;
    }

    /// A copy holding only the persisted columns
    pub fn columns(&self) -> Router {
        let mut row = Router::default();
        row.copy_columns_from(self);
        row
    }

    /// Builder-style setter for the flow source address
    pub fn with_flow_source_ip(mut self, ip: IpAddr) -> Self {
        self.flow_source_ip = Some(ip);
        self
    }

    /// Builder-style setter for the interface table
    pub fn with_interfaces(mut self, interfaces: Vec<ManagedInterface>) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// Builder-style setter for the SNMP config
    pub fn with_snmp(mut self, snmp: UserSnmpConfig) -> Self {
        self.snmp = Some(snmp);
        self
    }
}
