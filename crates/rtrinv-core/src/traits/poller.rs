// # Interface Poller Trait
//
// Defines the interface to the device polling transport.
//
// ## Implementations
//
// - Static tables: `StaticTablePoller` (daemon default, tests)
// - Future: SNMP walk of IF-MIB / IF-X-MIB
//
// ## Usage
//
// ```rust,ignore
// use rtrinv_core::{InterfacePoller, Router};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let poller = /* InterfacePoller implementation */;
//
//     let table = poller.poll(&Router::new("alu-01")).await?;
//     for interface in &table {
//         println!("{} speed={}", interface, interface.speed);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{ManagedInterface, Router};

/// Trait for interface poller implementations
///
/// # Output
///
/// `poll()` returns the device's current interface table. Interfaces carry no
/// storage identity and need not carry `router_id`; the engine stamps it.
/// A fresh counters sample, when collected, goes in `counters.current`; the
/// engine chains it to the previous sample.
///
/// # Forbidden
///
/// - Writing to the store (owned by `ActionExecutor`)
/// - Deciding what changed (owned by `reconcile`)
/// - Looping or sleeping (the engine schedules polls)
#[async_trait]
pub trait InterfacePoller: Send + Sync {
    /// Fetch the current interface table of `router`
    async fn poll(&self, router: &Router) -> Result<Vec<ManagedInterface>, crate::Error>;

    /// Get the poller name for logging
    fn poller_name(&self) -> &'static str;
}
