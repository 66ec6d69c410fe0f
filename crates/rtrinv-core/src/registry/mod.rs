//! Plugin-based store registry
//!
//! The registry allows inventory stores to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rtrinv_core::registry::StoreRegistry;
//! use rtrinv_core::config::StoreConfig;
//!
//! // Memory and file stores come pre-registered
//! let registry = StoreRegistry::with_builtin_stores();
//!
//! // Register a third-party backend
//! registry.register_store("postgres", Box::new(PostgresStoreFactory));
//!
//! let store = registry.create_store(&StoreConfig::Memory).await?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::state::{FileInventoryStoreFactory, MemoryInventoryStoreFactory};
use crate::traits::{InventoryStore, StoreFactory};

/// Store registry for plugin-based store creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Arc<dyn StoreFactory>>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryInventoryStoreFactory));
        registry.register_store("file", Box::new(FileInventoryStoreFactory));
        registry
    }

    /// Register a store factory under `name`, replacing any previous one
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn StoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(|e| e.into_inner());
        stores.insert(name.into(), Arc::from(factory));
    }

    /// Create a store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn InventoryStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub async fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn InventoryStore>> {
        let store_type = config.type_name();

        let factory = self
            .stores
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(store_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        // Lock is released before the async create
        factory.create(&config.factory_config()).await
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(|e| e.into_inner());
        stores.contains_key(name)
    }
}
