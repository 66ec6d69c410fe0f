//! Managed interface record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CounterHistory, RecordId};

/// One row of a router's interface table
///
/// For reconciliation an interface is identified by `(router_id, name, index)`,
/// never by `id`: freshly polled interfaces have no storage identity yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagedInterface {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Owning router
    #[serde(default)]
    pub router_id: Option<RecordId>,
    /// ifName
    pub name: String,
    /// ifAlias
    #[serde(default)]
    pub alias: String,
    /// ifHighSpeed, in bits per second
    #[serde(default)]
    pub speed: u64,
    /// ifIndex as assigned by the device
    #[serde(default)]
    pub index: i32,

    /// Live counters, never persisted
    #[serde(skip)]
    pub counters: CounterHistory,
}

impl ManagedInterface {
    pub fn new(name: impl Into<String>, index: i32) -> Self {
        Self {
            name: name.into(),
            index,
            ..Default::default()
        }
    }

    pub fn with_speed(mut self, speed: u64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_router(mut self, router_id: RecordId) -> Self {
        self.router_id = Some(router_id);
        self
    }

    /// Copy of the persisted columns, without counters
    pub fn columns(&self) -> ManagedInterface {
        ManagedInterface {
            counters: CounterHistory::default(),
            ..self.clone()
        }
    }
}

impl fmt::Display for ManagedInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (index {})", self.name, self.index)
    }
}
