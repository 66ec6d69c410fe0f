//! Action executor
//!
//! Applies a diff computed by [`crate::reconcile::reconcile`] to the store
//! and returns the interface collection the router should hold afterward.
//!
//! Actions run in diff order and one at a time. There is no rollback: under
//! [`FailurePolicy::Abort`] writes that succeeded before the failing action
//! stay in the store. Wrap the call in a store transaction if that matters.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{ManagedInterface, RecordId};
use crate::reconcile::{DiffAction, DiffSummary};
use crate::traits::InventoryStore;

/// What to do when one action of a diff fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure and return it
    #[default]
    Abort,
    /// Record the failure and apply the remaining actions
    Continue,
}

/// Result of applying a diff
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Resulting interfaces, in polled order
    pub interfaces: Vec<ManagedInterface>,
    /// Actions that went through, by kind
    pub applied: DiffSummary,
    /// Failures recorded under [`FailurePolicy::Continue`]
    ///
    /// Each one is an [`Error::ActionFailed`].
    pub failures: Vec<Error>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pushes diff actions to an [`InventoryStore`]
#[derive(Clone)]
pub struct ActionExecutor {
    store: Arc<dyn InventoryStore>,
    policy: FailurePolicy,
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn InventoryStore>, policy: FailurePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Apply `diff` for the router identified by `router_id`
    ///
    /// `polled` and `stored` must be the slices the diff was computed from.
    /// An interface whose action failed is left out of the report, except a
    /// failed `Reload` which keeps the stored record.
    pub async fn apply(
        &self,
        router_id: RecordId,
        polled: &[ManagedInterface],
        stored: &[ManagedInterface],
        diff: &[DiffAction],
    ) -> Result<ApplyReport> {
        let mut slots: Vec<Option<ManagedInterface>> = vec![None; polled.len()];
        let mut report = ApplyReport::default();

        for action in diff {
            match self.apply_one(router_id, polled, stored, action).await {
                Ok(Some((i, interface))) => {
                    slots[i] = Some(interface);
                    report.applied.count(action);
                }
                Ok(None) => report.applied.count(action),
                Err(e) => {
                    let record = describe(action, polled, stored);
                    let err = Error::action_failed(*action, record, e);
                    match self.policy {
                        FailurePolicy::Abort => return Err(err),
                        FailurePolicy::Continue => {
                            warn!("{}", err);
                            if let DiffAction::Reload { polled: i, stored: j } = *action {
                                slots[i] = Some(with_counters(&stored[j], &polled[i]));
                            }
                            report.failures.push(err);
                        }
                    }
                }
            }
        }

        report.interfaces = slots.into_iter().flatten().collect();
        Ok(report)
    }

    async fn apply_one(
        &self,
        router_id: RecordId,
        polled: &[ManagedInterface],
        stored: &[ManagedInterface],
        action: &DiffAction,
    ) -> Result<Option<(usize, ManagedInterface)>> {
        match *action {
            DiffAction::Create { polled: i } => {
                let row = ManagedInterface {
                    router_id: Some(router_id),
                    ..polled[i].columns()
                };
                let created = self.store.create_interface(&row).await?;
                debug!("Created interface {} as {:?}", created, created.id);
                Ok(Some((i, with_counters(&created, &polled[i]))))
            }
            DiffAction::Reload { polled: i, stored: j } => {
                let existing = &stored[j];
                let id = existing.id.ok_or_else(|| Error::missing_identity(existing.to_string()))?;
                let row = ManagedInterface {
                    id: Some(id),
                    created_at: existing.created_at,
                    updated_at: existing.updated_at,
                    router_id: Some(router_id),
                    ..polled[i].columns()
                };
                let saved = self.store.save_interface(&row).await?;
                debug!("Reloaded interface {}", saved);
                Ok(Some((i, with_counters(&saved, &polled[i]))))
            }
            DiffAction::Remove { stored: j } => {
                let existing = &stored[j];
                if existing.id.is_none() {
                    return Err(Error::missing_identity(existing.to_string()));
                }
                self.store.delete_interface(existing).await?;
                debug!("Removed interface {}", existing);
                Ok(None)
            }
            DiffAction::Untouch { polled: i, stored: j } => Ok(Some((i, with_counters(&stored[j], &polled[i])))),
        }
    }
}

/// `record` with the counters of the polled interface attached
fn with_counters(record: &ManagedInterface, polled: &ManagedInterface) -> ManagedInterface {
    ManagedInterface {
        counters: polled.counters,
        ..record.columns()
    }
}

fn describe(action: &DiffAction, polled: &[ManagedInterface], stored: &[ManagedInterface]) -> String {
    action
        .stored_index()
        .map(|j| &stored[j])
        .or_else(|| action.polled_index().map(|i| &polled[i]))
        .map(ToString::to_string)
        .unwrap_or_default()
}
