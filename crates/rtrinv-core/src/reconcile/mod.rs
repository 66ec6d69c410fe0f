//! Interface reconciliation
//!
//! Computes the ordered list of actions that turns the stored interface set
//! of a router into the freshly polled one.
//!
//! ## Ordering
//!
//! ```text
//! polled:  [p0, p1, p2]        stored: [s0, s1]
//!            │   │   │
//!            ▼   ▼   ▼
//! pass 1:  one CREATE / RELOAD / UNTOUCH per polled element, polled order
//! pass 2:  one REMOVE per stored element with no counterpart, stored order
//! ```
//!
//! The function is pure and total. Matching is a linear scan where the first
//! stored match wins, so the cost is O(n·m) per router; interface tables are
//! tens of rows, not thousands.

pub mod identity;

pub use identity::{almost_equal, routers_equal, same_attributes, same_content, same_identity, same_interface};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ManagedInterface;

/// One step of a reconciliation
///
/// Indices point into the `polled` and `stored` slices the diff was computed
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum DiffAction {
    /// Polled interface has no stored counterpart
    Create { polled: usize },
    /// Stored counterpart exists but its content changed
    Reload { polled: usize, stored: usize },
    /// Stored interface is no longer reported by the device
    Remove { stored: usize },
    /// Stored counterpart is up to date
    Untouch { polled: usize, stored: usize },
}

impl DiffAction {
    pub fn polled_index(&self) -> Option<usize> {
        match *self {
            DiffAction::Create { polled }
            | DiffAction::Reload { polled, .. }
            | DiffAction::Untouch { polled, .. } => Some(polled),
            DiffAction::Remove { .. } => None,
        }
    }

    pub fn stored_index(&self) -> Option<usize> {
        match *self {
            DiffAction::Reload { stored, .. }
            | DiffAction::Remove { stored }
            | DiffAction::Untouch { stored, .. } => Some(stored),
            DiffAction::Create { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DiffAction::Create { .. } => "CREATE",
            DiffAction::Reload { .. } => "RELOAD",
            DiffAction::Remove { .. } => "REMOVE",
            DiffAction::Untouch { .. } => "UNTOUCH",
        }
    }

    /// Whether applying the action touches the store
    pub fn is_write(&self) -> bool {
        !matches!(self, DiffAction::Untouch { .. })
    }
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |i: Option<usize>| i.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}({}, {})",
            self.kind(),
            side(self.polled_index()),
            side(self.stored_index())
        )
    }
}

/// Compute the actions that bring `stored` in line with `polled`
pub fn reconcile(polled: &[ManagedInterface], stored: &[ManagedInterface]) -> Vec<DiffAction> {
    if stored.is_empty() {
        return (0..polled.len())
            .map(|polled| DiffAction::Create { polled })
            .collect();
    }

    let mut diff = Vec::with_capacity(polled.len() + stored.len());

    for (i, p) in polled.iter().enumerate() {
        let action = match stored.iter().position(|s| same_identity(p, s)) {
            Some(j) if same_content(p, &stored[j]) => DiffAction::Untouch { polled: i, stored: j },
            Some(j) => DiffAction::Reload { polled: i, stored: j },
            None => DiffAction::Create { polled: i },
        };
        diff.push(action);
    }

    for (j, s) in stored.iter().enumerate() {
        if !polled.iter().any(|p| same_identity(p, s)) {
            diff.push(DiffAction::Remove { stored: j });
        }
    }

    diff
}

/// Action counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub created: usize,
    pub reloaded: usize,
    pub removed: usize,
    pub untouched: usize,
}

impl DiffSummary {
    pub fn of(diff: &[DiffAction]) -> Self {
        let mut summary = Self::default();
        for action in diff {
            summary.count(action);
        }
        summary
    }

    pub(crate) fn count(&mut self, action: &DiffAction) {
        match action {
            DiffAction::Create { .. } => self.created += 1,
            DiffAction::Reload { .. } => self.reloaded += 1,
            DiffAction::Remove { .. } => self.removed += 1,
            DiffAction::Untouch { .. } => self.untouched += 1,
        }
    }

    /// Number of actions that write to the store
    pub fn writes(&self) -> usize {
        self.created + self.reloaded + self.removed
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} reloaded, {} removed, {} untouched",
            self.created, self.reloaded, self.removed, self.untouched
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intf(name: &str, index: i32, speed: u64) -> ManagedInterface {
        ManagedInterface::new(name, index).with_speed(speed)
    }

    #[test]
    fn display_marks_absent_side() {
        assert_eq!(DiffAction::Create { polled: 1 }.to_string(), "CREATE(1, -)");
        assert_eq!(DiffAction::Remove { stored: 2 }.to_string(), "REMOVE(-, 2)");
        assert_eq!(
            DiffAction::Untouch { polled: 0, stored: 0 }.to_string(),
            "UNTOUCH(0, 0)"
        );
    }

    #[test]
    fn first_stored_match_wins() {
        let stored = vec![intf("1/1/1", 1, 10), intf("1/1/1", 1, 10)];
        let polled = vec![intf("1/1/1", 1, 10)];

        // the duplicate still has a polled counterpart, so it is not removed
        assert_eq!(
            reconcile(&polled, &stored),
            vec![DiffAction::Untouch { polled: 0, stored: 0 }]
        );
    }

    #[test]
    fn reorder_is_untouched() {
        let stored = vec![intf("1/1/1", 1, 10), intf("2/2/2", 2, 20)];
        let polled = vec![intf("2/2/2", 2, 20), intf("1/1/1", 1, 10)];

        assert_eq!(
            reconcile(&polled, &stored),
            vec![
                DiffAction::Untouch { polled: 0, stored: 1 },
                DiffAction::Untouch { polled: 1, stored: 0 },
            ]
        );
    }

    #[test]
    fn summary_counts_kinds() {
        let diff = vec![
            DiffAction::Untouch { polled: 0, stored: 0 },
            DiffAction::Create { polled: 1 },
            DiffAction::Reload { polled: 2, stored: 1 },
            DiffAction::Remove { stored: 2 },
        ];
        let summary = DiffSummary::of(&diff);
        assert_eq!(summary.writes(), 3);
        assert_eq!(summary.untouched, 1);
    }

    #[test]
    fn action_serializes_with_tag() {
        let json = serde_json::to_value(DiffAction::Reload { polled: 1, stored: 2 }).unwrap();
        assert_eq!(json["action"], "RELOAD");
        assert_eq!(json["polled"], 1);
    }
}
