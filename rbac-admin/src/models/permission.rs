//! Permission records

use chrono::{DateTime, Utc};
use rbac_core::Lifecycle;
use serde::{Deserialize, Serialize};

use super::PermissionId;

/// A named permission that roles can bundle.
///
/// Names are globally unique, including among inactive permissions.
///
/// # Examples
///
/// ```
/// use rbac_admin::models::{Permission, PermissionId};
///
/// let mut perm = Permission::new(PermissionId(1), "Leer");
/// assert!(perm.is_active());
///
/// assert!(perm.deactivate());
/// assert!(!perm.is_active());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    /// Unique permission ID
    pub id: PermissionId,

    /// Unique permission name, matched exactly by the gate
    pub name: String,

    /// Active or soft-deleted
    pub lifecycle: Lifecycle,

    /// When the permission was created
    pub created_at: DateTime<Utc>,

    /// When the permission was last changed
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a new active permission.
    pub fn new(id: PermissionId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the permission is active.
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Rename the permission.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Mark the permission inactive.
    ///
    /// # Returns
    ///
    /// `true` if the permission was active before the call
    pub fn deactivate(&mut self) -> bool {
        let changed = self.lifecycle.deactivate();
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}
