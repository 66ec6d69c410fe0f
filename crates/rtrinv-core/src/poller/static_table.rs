// # Static Table Poller
//
// Serves interface tables held in memory instead of walking a device.
//
// The daemon seeds it from configuration; tests swap tables between
// cycles to simulate interfaces appearing, changing and disappearing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::{ManagedInterface, Router};
use crate::traits::InterfacePoller;

/// Poller answering from per-router tables keyed by `unique_name`
#[derive(Debug, Clone, Default)]
pub struct StaticTablePoller {
    tables: Arc<RwLock<HashMap<String, Vec<ManagedInterface>>>>,
}

impl StaticTablePoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one table per router from the routers' own interface lists
    pub fn from_routers<'a>(routers: impl IntoIterator<Item = &'a Router>) -> Self {
        let tables = routers
            .into_iter()
            .map(|r| (r.unique_name.clone(), r.interfaces.iter().map(|i| i.columns()).collect()))
            .collect();
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Replace the table served for `unique_name`
    pub async fn set_table(&self, unique_name: impl Into<String>, table: Vec<ManagedInterface>) {
        self.tables.write().await.insert(unique_name.into(), table);
    }

    /// Stop serving `unique_name`; later polls of it fail
    pub async fn remove_table(&self, unique_name: &str) {
        self.tables.write().await.remove(unique_name);
    }
}

#[async_trait]
impl InterfacePoller for StaticTablePoller {
    async fn poll(&self, router: &Router) -> Result<Vec<ManagedInterface>, Error> {
        let guard = self.tables.read().await;
        guard
            .get(&router.unique_name)
            .cloned()
            .ok_or_else(|| Error::poll(format!("no interface table for router {}", router.unique_name)))
    }

    fn poller_name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_seeded_tables() {
        let router = Router::new("alu-01").with_interfaces(vec![ManagedInterface::new("1/1/1", 1)]);
        let poller = StaticTablePoller::from_routers([&router]);

        let table = poller.poll(&router).await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].name, "1/1/1");

        poller.set_table("alu-01", Vec::new()).await;
        assert!(poller.poll(&router).await.unwrap().is_empty());

        poller.remove_table("alu-01").await;
        assert!(matches!(poller.poll(&router).await, Err(Error::Poll(_))));
    }
}
