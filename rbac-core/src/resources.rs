//! # Resources
//!
//! The record kinds administered by the RBAC admin module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Administered record kinds.
///
/// Used to label gate failures, log fields and confirmation messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Named permission records.
    Permission,
    /// Roles bundling permissions.
    Role,
    /// User accounts holding roles.
    User,
}

impl Resource {
    /// Get the string representation of the resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Permission => "permission",
            Resource::Role => "role",
            Resource::User => "user",
        }
    }

    /// Get a human-readable name for the resource.
    ///
    /// # Example
    ///
    /// ```
    /// use rbac_core::resources::Resource;
    ///
    /// assert_eq!(Resource::Role.display_name(), "Role");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::Permission => "Permission",
            Resource::Role => "Role",
            Resource::User => "User",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
