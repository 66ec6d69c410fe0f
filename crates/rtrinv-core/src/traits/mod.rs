//! Core traits for the router inventory
//!
//! This module defines the abstract interfaces to the external collaborators.
//!
//! - [`InventoryStore`]: The persistence engine
//! - [`InterfacePoller`]: Device polling (SNMP or a stand-in)

pub mod inventory_store;
pub mod poller;

pub use inventory_store::{InventoryStore, StoreFactory};
pub use poller::InterfacePoller;
