//! Role records
//!
//! A role bundles permissions. Users receive permissions only through the
//! active roles assigned to them.

use chrono::{DateTime, Utc};
use rbac_core::{Lifecycle, PermissionSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Permission, PermissionId, RoleId};

/// A named role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Unique role ID
    pub id: RoleId,

    /// Unique role name
    pub name: String,

    /// Active or soft-deleted
    pub lifecycle: Lifecycle,

    /// When the role was created
    pub created_at: DateTime<Utc>,

    /// When the role was last changed
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new active role.
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the role is active.
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Rename the role.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Mark the role inactive.
    ///
    /// # Returns
    ///
    /// `true` if the role was active before the call
    pub fn deactivate(&mut self) -> bool {
        let changed = self.lifecycle.deactivate();
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// A role together with the permissions currently attached to it.
///
/// Permissions are ordered by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleWithPermissions {
    /// The role record
    #[serde(flatten)]
    pub role: Role,

    /// Attached permissions, active or not
    pub permissions: Vec<Permission>,
}

impl RoleWithPermissions {
    /// Ids of the attached permissions.
    pub fn permission_ids(&self) -> BTreeSet<PermissionId> {
        self.permissions.iter().map(|p| p.id).collect()
    }

    /// Names of the attached permissions.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbac_admin::models::{Permission, PermissionId, Role, RoleId, RoleWithPermissions};
    ///
    /// let role = RoleWithPermissions {
    ///     role: Role::new(RoleId(1), "Editor"),
    ///     permissions: vec![
    ///         Permission::new(PermissionId(1), "Leer"),
    ///         Permission::new(PermissionId(2), "Editar"),
    ///     ],
    /// };
    /// assert!(role.permission_names().has("Editar"));
    /// ```
    pub fn permission_names(&self) -> PermissionSet {
        self.permissions.iter().map(|p| p.name.clone()).collect()
    }
}

/// Input for creating or updating a role.
///
/// `permission_ids` is the complete desired set: on update, anything not
/// listed is detached. Duplicate ids collapse.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleInput {
    /// Role name
    pub name: String,

    /// Permissions to attach
    #[serde(default)]
    pub permission_ids: Vec<PermissionId>,
}

impl RoleInput {
    /// Create input with a name and no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permission_ids: Vec::new(),
        }
    }

    /// Set the permissions to attach.
    pub fn with_permissions<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = PermissionId>,
    {
        self.permission_ids = ids.into_iter().collect();
        self
    }

    /// The desired permission set with duplicates collapsed.
    pub fn permission_set(&self) -> BTreeSet<PermissionId> {
        self.permission_ids.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_creation() {
        let role = Role::new(RoleId(1), "Administrador");
        assert!(role.is_active());
        assert_eq!(role.name, "Administrador");
    }

    #[test]
    fn test_role_deactivate() {
        let mut role = Role::new(RoleId(1), "Editor");
        assert!(role.deactivate());
        assert!(!role.is_active());
        assert!(!role.deactivate());
    }

    #[test]
    fn test_role_input_collapses_duplicates() {
        let input = RoleInput::new("Editor").with_permissions([
            PermissionId(2),
            PermissionId(1),
            PermissionId(2),
        ]);
        let set = input.permission_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&PermissionId(1)));
    }

    #[test]
    fn test_role_input_defaults_missing_permissions() {
        let input: RoleInput = serde_json::from_value(serde_json::json!({ "name": "Auditor" })).unwrap();
        assert!(input.permission_ids.is_empty());
    }

    #[test]
    fn test_role_with_permissions_flattens() {
        let role = RoleWithPermissions {
            role: Role::new(RoleId(4), "Auditor"),
            permissions: vec![Permission::new(PermissionId(1), "Leer")],
        };
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["name"], "Auditor");
        assert_eq!(json["permissions"][0]["name"], "Leer");
        assert_eq!(role.permission_ids(), BTreeSet::from([PermissionId(1)]));
    }
}
