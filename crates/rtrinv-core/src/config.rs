//! Configuration types for the router inventory
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

use crate::executor::FailurePolicy;
use crate::model::{ManagedInterface, Router, UserSnmpConfig};
use crate::sync::RouterMetadataPolicy;

/// Main inventory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Routers to manage
    pub routers: Vec<RouterConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl InventoryConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            store: StoreConfig::default(),
            routers: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.routers.is_empty() {
            return Err(crate::Error::config("No routers configured"));
        }

        let mut seen = HashSet::new();
        for router in &self.routers {
            router.validate()?;
            if !seen.insert(router.unique_name.as_str()) {
                return Err(crate::Error::config(format!(
                    "Router unique_name '{}' is configured more than once",
                    router.unique_name
                )));
            }
        }

        self.store.validate()?;
        self.engine.validate()?;

        Ok(())
    }

    /// Build the in-memory routers described by this configuration
    pub fn build_routers(&self) -> Vec<Router> {
        self.routers.iter().map(RouterConfig::to_router).collect()
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file store
    File {
        /// Path to the inventory file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File store path cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name used for registry lookup
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }

    /// Configuration handed to the store factory
    pub fn factory_config(&self) -> serde_json::Value {
        match self {
            StoreConfig::File { path } => serde_json::json!({ "path": path }),
            StoreConfig::Memory => serde_json::json!({}),
            StoreConfig::Custom { config, .. } => config.clone(),
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Natural key (e.g., "alu-01")
    pub unique_name: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub contact: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub lat: f64,

    #[serde(default)]
    pub lon: f64,

    /// GETBULK max-repetitions
    #[serde(default = "default_bulk_max_repetitions")]
    pub bulk_max_repetitions: u32,

    /// Source address of the router's flow export
    #[serde(default)]
    pub flow_source_ip: Option<IpAddr>,

    /// Polling interval in seconds; 0 uses the engine default
    #[serde(default)]
    pub polling_interval_secs: u64,

    /// SNMP settings
    #[serde(default)]
    pub snmp: Option<UserSnmpConfig>,

    /// Interfaces known before the first poll
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
}

impl RouterConfig {
    /// Create a new router configuration
    pub fn new(unique_name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            name: String::new(),
            description: String::new(),
            contact: String::new(),
            location: String::new(),
            lat: 0.0,
            lon: 0.0,
            bulk_max_repetitions: default_bulk_max_repetitions(),
            flow_source_ip: None,
            polling_interval_secs: 0,
            snmp: None,
            interfaces: Vec::new(),
        }
    }

    /// Set the flow source address
    pub fn with_flow_source_ip(mut self, ip: IpAddr) -> Self {
        self.flow_source_ip = Some(ip);
        self
    }

    /// Add a seed interface
    pub fn with_interface(mut self, interface: InterfaceConfig) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Validate the router configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.unique_name.trim().is_empty() {
            return Err(crate::Error::config("Router unique_name cannot be empty"));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(crate::Error::config(format!(
                "Router {} latitude {} out of range",
                self.unique_name, self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(crate::Error::config(format!(
                "Router {} longitude {} out of range",
                self.unique_name, self.lon
            )));
        }
        if let Some(snmp) = &self.snmp {
            snmp.validate()?;
        }

        let mut keys = HashSet::new();
        for interface in &self.interfaces {
            if !keys.insert((interface.name.as_str(), interface.index)) {
                return Err(crate::Error::config(format!(
                    "Router {} lists interface {} (index {}) twice",
                    self.unique_name, interface.name, interface.index
                )));
            }
        }

        Ok(())
    }

    /// Build the in-memory router, not yet persisted
    pub fn to_router(&self) -> Router {
        Router {
            name: self.name.clone(),
            description: self.description.clone(),
            contact: self.contact.clone(),
            location: self.location.clone(),
            lat: self.lat,
            lon: self.lon,
            bulk_max_repetitions: self.bulk_max_repetitions,
            flow_source_ip: self.flow_source_ip,
            polling_interval_secs: self.polling_interval_secs,
            snmp: self.snmp.clone(),
            interfaces: self.interfaces.iter().map(InterfaceConfig::to_interface).collect(),
            ..Router::new(self.unique_name.clone())
        }
    }
}

/// Seed interface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub speed: u64,
    #[serde(default)]
    pub index: i32,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>, index: i32) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            speed: 0,
            index,
        }
    }

    pub fn to_interface(&self) -> ManagedInterface {
        ManagedInterface::new(self.name.clone(), self.index)
            .with_alias(self.alias.clone())
            .with_speed(self.speed)
    }
}

fn default_bulk_max_repetitions() -> u32 {
    10
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Polling interval for routers that do not set their own (in seconds)
    #[serde(default = "default_polling_interval_secs")]
    pub default_polling_interval_secs: u64,

    /// What to do when one action of a diff fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Which side wins when a known router's metadata differs from storage
    #[serde(default)]
    pub router_metadata_policy: RouterMetadataPolicy,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.default_polling_interval_secs == 0 {
            return Err(crate::Error::config("Default polling interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_polling_interval_secs: default_polling_interval_secs(),
            failure_policy: FailurePolicy::default(),
            router_metadata_policy: RouterMetadataPolicy::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_polling_interval_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    1000
}
