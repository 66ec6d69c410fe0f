// # Inventory Store Implementations
//
// This module provides implementations of the InventoryStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;
mod tables;

pub use file::{FileInventoryStore, FileInventoryStoreFactory};
pub use memory::{MemoryInventoryStore, MemoryInventoryStoreFactory};
