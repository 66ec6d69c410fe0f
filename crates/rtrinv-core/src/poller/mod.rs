//! Interface poller implementations
//!
//! Real SNMP transports live outside this crate; the poller here serves
//! fixed interface tables.

pub mod static_table;

pub use static_table::StaticTablePoller;
