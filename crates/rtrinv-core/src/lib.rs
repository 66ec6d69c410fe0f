// # rtrinv-core
//
// Core library for router inventory reconciliation.
//
// ## Architecture Overview
//
// This library keeps a persisted inventory of routers and their interface
// tables in line with what the devices report:
// - **InterfacePoller**: Trait for reading a router's interface table
// - **InventoryStore**: Trait for the persistence engine
// - **reconcile()**: Pure diff between polled and stored interfaces
// - **ActionExecutor**: Applies a diff to the store
// - **RouterSynchronizer**: Keeps router rows and in-memory routers consistent
// - **InventoryEngine**: Orchestrates bootstrap and the per-router poll cycle
// - **StoreRegistry**: Plugin-based registry for store backends
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Diffing is pure; only the executor writes
// 2. **Identity from storage**: Records are matched by natural key, never by id
// 3. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod load;
pub mod model;
pub mod poller;
pub mod reconcile;
pub mod registry;
pub mod state;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, InterfaceConfig, InventoryConfig, RouterConfig, StoreConfig};
pub use engine::{EngineEvent, InventoryEngine, RouterTask};
pub use error::{Error, Result};
pub use executor::{ActionExecutor, ApplyReport, FailurePolicy};
pub use model::{ManagedInterface, RecordId, Router, UserSnmpConfig};
pub use reconcile::{DiffAction, DiffSummary, reconcile};
pub use registry::StoreRegistry;
pub use state::{FileInventoryStore, MemoryInventoryStore};
pub use sync::{RouterMetadataPolicy, RouterSynchronizer};
pub use traits::{InterfacePoller, InventoryStore};
