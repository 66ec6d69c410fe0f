//! Router synchronization
//!
//! Keeps the storage-assigned fields of in-memory routers (identity,
//! creation and update times) consistent with the persisted rows, and
//! decides which side wins when a known router's metadata diverged.
//!
//! ## Policy
//!
//! Routers are created when absent. For routers the store already knows,
//! [`RouterMetadataPolicy`] picks the winner:
//!
//! - `PullFromStore`: storage is the source of truth and local edits to
//!   scalar fields are discarded
//! - `PushLocal`: local scalar fields are saved over the stored row
//!
//! Interfaces never go through this path; they are reconciled and pushed
//! by [`crate::executor::ActionExecutor`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{EntityKind, Router, UserSnmpConfig};
use crate::reconcile::same_attributes;
use crate::traits::InventoryStore;

/// Which side wins when a stored router differs from the in-memory one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterMetadataPolicy {
    /// Overwrite the in-memory router from storage
    #[default]
    PullFromStore,
    /// Save the in-memory router over the stored row
    PushLocal,
}

/// Copy the storage-assigned and persisted fields of the single candidate
/// into `router`
///
/// `candidates` is the result of looking up `router.unique_name`. Anything
/// other than exactly one row means the uniqueness invariant is broken (or
/// a writer raced us) and fails with [`Error::Consistency`]. Interfaces and
/// SNMP config are left untouched.
pub fn sync_from_store(router: &mut Router, candidates: &[Router]) -> Result<()> {
    match candidates {
        [stored] => {
            router.copy_columns_from(stored);
            Ok(())
        }
        _ => Err(Error::consistency(router.unique_name.clone(), candidates.len())),
    }
}

/// Outcome of [`RouterSynchronizer::bootstrap_or_create`], by unique name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created: Vec<String>,
    pub pulled: Vec<String>,
    pub pushed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl BootstrapReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.pulled.len() + self.pushed.len() + self.unchanged.len()
    }
}

/// Router-level synchronization against a store
#[derive(Clone)]
pub struct RouterSynchronizer {
    store: Arc<dyn InventoryStore>,
    policy: RouterMetadataPolicy,
}

impl RouterSynchronizer {
    pub fn new(store: Arc<dyn InventoryStore>, policy: RouterMetadataPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RouterMetadataPolicy {
        self.policy
    }

    /// Re-read `router` by unique name and copy the stored row into it
    pub async fn refresh(&self, router: &mut Router) -> Result<()> {
        let candidates = self.store.find_routers_by_unique_name(&router.unique_name).await?;
        sync_from_store(router, &candidates)
    }

    /// Make the store and the in-memory routers agree
    ///
    /// On an empty store every router is created, cascading to its
    /// interfaces and SNMP config, then refreshed to pick up its identity.
    /// Otherwise each router is looked up by unique name: absent ones are
    /// created, divergent ones are resolved by the configured policy.
    pub async fn bootstrap_or_create(&self, routers: &mut [Router]) -> Result<BootstrapReport> {
        let mut report = BootstrapReport::default();

        if self.store.count(EntityKind::Router).await? == 0 {
            info!("Store is empty, creating {} router(s)", routers.len());
            for router in routers.iter_mut() {
                self.create(router).await?;
                report.created.push(router.unique_name.clone());
            }
            return Ok(report);
        }

        for router in routers.iter_mut() {
            let candidates = self.store.find_routers_by_unique_name(&router.unique_name).await?;
            match candidates.as_slice() {
                [] => {
                    debug!("Router {} is not stored yet, creating", router.unique_name);
                    self.create(router).await?;
                    report.created.push(router.unique_name.clone());
                }
                [stored] if same_attributes(router, stored) => {
                    sync_from_store(router, &candidates)?;
                    report.unchanged.push(router.unique_name.clone());
                }
                [stored] => match self.policy {
                    RouterMetadataPolicy::PullFromStore => {
                        debug!("Pulling stored metadata into router {}", router.unique_name);
                        sync_from_store(router, &candidates)?;
                        report.pulled.push(router.unique_name.clone());
                    }
                    RouterMetadataPolicy::PushLocal => {
                        debug!("Pushing local metadata of router {}", router.unique_name);
                        let mut row = router.columns();
                        row.id = stored.id;
                        row.created_at = stored.created_at;
                        self.store.save_router(&row).await?;
                        self.refresh(router).await?;
                        report.pushed.push(router.unique_name.clone());
                    }
                },
                _ => return Err(Error::consistency(router.unique_name.clone(), candidates.len())),
            }
        }

        Ok(report)
    }

    /// Bring the stored SNMP config of a persisted router in line with policy
    ///
    /// A locally configured SNMP config is created when the store has none.
    /// When both exist and differ, the metadata policy decides the winner.
    pub async fn sync_snmp_config(&self, router: &mut Router) -> Result<()> {
        let router_id = router.id.ok_or_else(|| {
            Error::missing_identity(format!("router {} was never persisted", router.unique_name))
        })?;

        let stored = match self.store.find_snmp_configs_by_router(router_id).await? {
            mut configs if configs.len() <= 1 => configs.pop(),
            configs => {
                warn!(
                    "Router {} has {} SNMP configs, expected at most one",
                    router.unique_name,
                    configs.len()
                );
                return Err(Error::consistency(router.unique_name.clone(), configs.len()));
            }
        };

        match (stored, router.snmp.take()) {
            (None, None) => {}
            (None, Some(mut local)) => {
                local.router_id = Some(router_id);
                router.snmp = Some(self.store.create_snmp_config(&local).await?);
            }
            (Some(stored), None) => router.snmp = Some(stored),
            (Some(stored), Some(local)) => {
                router.snmp = Some(if same_snmp_settings(&stored, &local) {
                    stored
                } else {
                    match self.policy {
                        RouterMetadataPolicy::PullFromStore => stored,
                        RouterMetadataPolicy::PushLocal => {
                            let row = UserSnmpConfig {
                                id: stored.id,
                                created_at: stored.created_at,
                                updated_at: stored.updated_at,
                                router_id: Some(router_id),
                                ..local
                            };
                            self.store.save_snmp_config(&row).await?
                        }
                    }
                });
            }
        }

        Ok(())
    }

    async fn create(&self, router: &mut Router) -> Result<()> {
        let created = self.store.create_router(router).await?;
        router.interfaces = created.interfaces;
        router.snmp = created.snmp;
        self.refresh(router).await
    }
}

/// SNMP configs equal apart from storage-assigned fields
fn same_snmp_settings(stored: &UserSnmpConfig, local: &UserSnmpConfig) -> bool {
    stored.network == local.network
        && stored.address == local.address
        && stored.timeout_secs == local.timeout_secs
        && stored.retries == local.retries
        && stored.max_msg_size == local.max_msg_size
        && stored.credentials == local.credentials
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;
    use crate::reconcile::routers_equal;
    use chrono::Utc;

    fn stored_row(unique_name: &str, id: u64) -> Router {
        Router {
            id: Some(RecordId(id)),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            location: "lyon".to_string(),
            ..Router::new(unique_name)
        }
    }

    #[test]
    fn single_candidate_is_copied() {
        let mut router = Router::new("alu-01")
            .with_interfaces(vec![crate::model::ManagedInterface::new("1/1/1", 1)]);
        let stored = stored_row("alu-01", 9);

        sync_from_store(&mut router, std::slice::from_ref(&stored)).unwrap();

        assert!(routers_equal(&router, &stored));
        assert_eq!(router.interfaces.len(), 1);
    }

    #[test]
    fn zero_candidates_is_a_consistency_error() {
        let mut router = Router::new("alu-01");
        let err = sync_from_store(&mut router, &[]).unwrap_err();
        assert!(matches!(err, Error::Consistency { found: 0, .. }));
    }

    #[test]
    fn two_candidates_is_a_consistency_error() {
        let mut router = Router::new("alu-01");
        let err = sync_from_store(&mut router, &[stored_row("alu-01", 1), stored_row("alu-01", 2)]).unwrap_err();
        assert!(matches!(err, Error::Consistency { found: 2, .. }));
        assert!(router.id.is_none());
    }

    #[test]
    fn snmp_settings_ignore_identity() {
        let local = UserSnmpConfig::v2c("10.0.1.1:161", "public");
        let stored = UserSnmpConfig {
            id: Some(RecordId(3)),
            router_id: Some(RecordId(1)),
            ..local.clone()
        };
        assert!(same_snmp_settings(&stored, &local));
    }
}
