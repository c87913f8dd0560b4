//! Association sync
//!
//! Replacing a many-to-many association set is computed as a set difference
//! and applied in one step: `attach = desired − current`,
//! `detach = current − desired`. Members present in both are left untouched.

use serde::Serialize;
use std::collections::BTreeSet;

/// The changes needed to turn one association set into another.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use rbac_admin::sync::SyncPlan;
///
/// let current = BTreeSet::from([1, 2]);
/// let desired = BTreeSet::from([2, 3]);
///
/// let plan = SyncPlan::diff(&current, &desired);
/// assert_eq!(plan.attach, BTreeSet::from([3]));
/// assert_eq!(plan.detach, BTreeSet::from([1]));
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncPlan<Id: Ord> {
    /// Members to add
    pub attach: BTreeSet<Id>,
    /// Members to remove
    pub detach: BTreeSet<Id>,
}

impl<Id: Ord + Copy> SyncPlan<Id> {
    /// Compute the plan from the current set to the desired set.
    pub fn diff(current: &BTreeSet<Id>, desired: &BTreeSet<Id>) -> Self {
        Self {
            attach: desired.difference(current).copied().collect(),
            detach: current.difference(desired).copied().collect(),
        }
    }

    /// Plan that removes every current member.
    pub fn detach_all(current: &BTreeSet<Id>) -> Self {
        Self {
            attach: BTreeSet::new(),
            detach: current.clone(),
        }
    }

    /// Check if applying the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.attach.is_empty() && self.detach.is_empty()
    }

    /// Apply the plan to the association rows owned by `owner`.
    ///
    /// Rows are `(owner, member)` pairs; rows of other owners are untouched.
    pub fn apply_to<Owner: Ord + Copy>(&self, owner: Owner, rows: &mut BTreeSet<(Owner, Id)>) {
        for member in &self.detach {
            rows.remove(&(owner, *member));
        }
        for member in &self.attach {
            rows.insert((owner, *member));
        }
    }
}
