//! Record lifecycle
//!
//! Users, roles and permissions are never removed. "Deleting" one moves it
//! from `Active` to `Inactive`, which is terminal.

use serde::{Deserialize, Serialize};

/// Lifecycle state shared by every administered record.
///
/// # Examples
///
/// ```
/// use rbac_core::Lifecycle;
///
/// let mut state = Lifecycle::default();
/// assert!(state.is_active());
///
/// assert!(state.deactivate());
/// assert!(!state.deactivate()); // already inactive
/// assert_eq!(state, Lifecycle::Inactive);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Usable: listed, assignable, and (for roles) granting permissions.
    #[default]
    Active,

    /// Soft-deleted. Kept for referential stability, never reactivated.
    Inactive,
}

impl Lifecycle {
    /// Check if the record is active.
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    /// Transition to `Inactive`.
    ///
    /// # Returns
    ///
    /// `true` if the state changed, `false` if it was already inactive
    pub fn deactivate(&mut self) -> bool {
        let changed = self.is_active();
        *self = Lifecycle::Inactive;
        changed
    }

    /// Get string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Active => "active",
            Lifecycle::Inactive => "inactive",
        }
    }
}

/// Filter over lifecycle states for listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleFilter {
    /// Only active records.
    #[default]
    ActiveOnly,
    /// Every record regardless of state.
    Any,
}

impl LifecycleFilter {
    /// Check whether a record in `state` passes the filter.
    pub fn matches(&self, state: Lifecycle) -> bool {
        match self {
            LifecycleFilter::ActiveOnly => state.is_active(),
            LifecycleFilter::Any => true,
        }
    }
}
