//! User records
//!
//! Users hold roles. The stored password is always an argon2 PHC string; the
//! plaintext only ever appears in the input types and is never serialized.

use chrono::{DateTime, Utc};
use rbac_core::{Lifecycle, LifecycleFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{Role, RoleId, RoleWithPermissions, UserId};
use crate::password;

/// A user account.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct User {
    /// Unique user ID
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Unique, lowercase email address
    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Active or soft-deleted
    pub lifecycle: Lifecycle,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last changed
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("lifecycle", &self.lifecycle)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// Creates a new active user from an already hashed password.
    pub fn new(id: UserId, record: NewUserRecord) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is active.
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Apply profile changes. The password hash is replaced only when one is given.
    pub fn apply(&mut self, changes: UserChanges) {
        self.name = changes.name;
        self.email = changes.email;
        if let Some(hash) = changes.password_hash {
            self.password_hash = hash;
        }
        self.updated_at = Utc::now();
    }

    /// Mark the user inactive.
    ///
    /// # Returns
    ///
    /// `true` if the user was active before the call
    pub fn deactivate(&mut self) -> bool {
        let changed = self.lifecycle.deactivate();
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    /// Check a plaintext password against the stored hash.
    pub fn verify_password(&self, candidate: &str) -> bool {
        password::verify_password(candidate, &self.password_hash)
    }
}

/// A user together with its assigned roles, ordered by role id.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserWithRoles {
    /// The user record
    #[serde(flatten)]
    pub user: User,

    /// Assigned roles, active or not
    pub roles: Vec<Role>,
}

impl UserWithRoles {
    /// Ids of the assigned roles.
    pub fn role_ids(&self) -> BTreeSet<RoleId> {
        self.roles.iter().map(|r| r.id).collect()
    }
}

/// Everything needed to resolve a user's effective permissions, read as one snapshot.
#[derive(Debug, Clone)]
pub struct UserGrants {
    /// The user record
    pub user: User,

    /// Assigned roles with their permissions
    pub roles: Vec<RoleWithPermissions>,
}

/// Input for creating a user.
#[derive(Clone, Default, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,

    /// Email address (must be lowercase)
    pub email: String,

    /// Plaintext password
    pub password: String,

    /// Repeated password; when present it must match `password`
    #[serde(default)]
    pub password_confirmation: Option<String>,

    /// Roles to assign
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role_ids", &self.role_ids)
            .finish()
    }
}

impl NewUser {
    /// Create input with the required fields and no roles.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            password_confirmation: None,
            role_ids: Vec::new(),
        }
    }

    /// Set the password confirmation.
    pub fn with_confirmation(mut self, confirmation: impl Into<String>) -> Self {
        self.password_confirmation = Some(confirmation.into());
        self
    }

    /// Set the roles to assign.
    pub fn with_roles<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = RoleId>,
    {
        self.role_ids = ids.into_iter().collect();
        self
    }
}

/// Input for updating a user.
///
/// A missing or blank `password` keeps the stored hash. `role_ids` is the
/// complete desired set; anything not listed is detached.
#[derive(Clone, Default, Deserialize)]
pub struct UserUpdate {
    /// Display name
    pub name: String,

    /// Email address (must be lowercase)
    pub email: String,

    /// New plaintext password
    #[serde(default)]
    pub password: Option<String>,

    /// Roles to keep assigned
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("role_ids", &self.role_ids)
            .finish()
    }
}

impl UserUpdate {
    /// Create input that keeps the current password and drops all roles.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: None,
            role_ids: Vec::new(),
        }
    }

    /// Rotate the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the roles to keep assigned.
    pub fn with_roles<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = RoleId>,
    {
        self.role_ids = ids.into_iter().collect();
        self
    }

    /// The new password, if one was actually supplied.
    pub fn supplied_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Validated, hashed user data handed to a store for insertion.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Argon2 password hash
    pub password_hash: String,
}

/// Validated user changes handed to a store.
#[derive(Debug, Clone)]
pub struct UserChanges {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Replacement hash; `None` keeps the stored one
    pub password_hash: Option<String>,
}

/// Listing filter for users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFilter {
    /// Only list active users
    #[serde(default = "default_true")]
    pub active_only: bool,

    /// Only list users holding this role
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

fn default_true() -> bool {
    true
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            active_only: true,
            role_id: None,
        }
    }
}

impl UserFilter {
    /// Include inactive users too.
    pub fn all() -> Self {
        Self {
            active_only: false,
            role_id: None,
        }
    }

    /// Lifecycle states passing the filter.
    pub fn lifecycle(&self) -> LifecycleFilter {
        if self.active_only {
            LifecycleFilter::ActiveOnly
        } else {
            LifecycleFilter::Any
        }
    }

    /// Restrict to holders of a role.
    pub fn with_role(mut self, role_id: RoleId) -> Self {
        self.role_id = Some(role_id);
        self
    }
}
