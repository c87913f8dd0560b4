//! Storage abstraction
//!
//! [`RbacStore`] is the persistence seam for the three entity tables and the
//! two association tables. Every method is one transaction: it checks all
//! constraints (uniqueness, referenced ids, existence) before writing, so a
//! failing call leaves no partial state, and a sync replaces an association
//! set in a single visible step.

use async_trait::async_trait;
use rbac_core::{LifecycleFilter, Resource};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::models::{
    NewUserRecord, Permission, PermissionId, Role, RoleId, RoleWithPermissions, UserChanges,
    UserFilter, UserGrants, UserId, UserWithRoles,
};
use crate::pagination::{Page, PageRequest};
use crate::sync::SyncPlan;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

/// Store error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique column already holds the value
    #[error("duplicate {field}: {value}")]
    Duplicate {
        /// Unique column
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// Association ids that reference no row
    #[error("unknown {field}: {ids:?}")]
    MissingReferences {
        /// Input field holding the ids
        field: &'static str,
        /// Offending ids, ascending
        ids: Vec<u64>,
    },

    /// The targeted row does not exist
    #[error("{resource} {id} not found")]
    NotFound {
        /// Table looked up
        resource: Resource,
        /// Requested id
        id: u64,
    },

    /// The targeted row is inactive and can no longer be edited
    #[error("{resource} {id} is inactive")]
    Inactive {
        /// Table looked up
        resource: Resource,
        /// Requested id
        id: u64,
    },

    /// Backend failure
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// An updated record together with the association changes applied to it.
#[derive(Debug, Clone)]
pub struct Updated<T, Id: Ord> {
    /// The record after the update
    pub record: T,
    /// Association rows attached and detached
    pub sync: SyncPlan<Id>,
}

/// A deactivated record.
#[derive(Debug, Clone)]
pub struct Deactivated<T> {
    /// The record after deactivation
    pub record: T,
    /// `false` if the record was already inactive
    pub changed: bool,
    /// Association rows removed
    pub detached: usize,
}

/// Persistence for permissions, roles, users and their associations.
///
/// Listings are ordered by id. Hydrated views (`RoleWithPermissions`,
/// `UserWithRoles`) list associated records ordered by id.
#[async_trait]
pub trait RbacStore: Send + Sync {
    // ----- permissions -----

    /// Page of permissions passing the filter.
    async fn list_permissions(
        &self,
        filter: LifecycleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Permission>>;

    /// Every active permission, unpaginated.
    async fn active_permissions(&self) -> StoreResult<Vec<Permission>>;

    /// Look up a permission by id.
    async fn get_permission(&self, id: PermissionId) -> StoreResult<Option<Permission>>;

    /// Look up a permission by exact name, active or not.
    async fn find_permission_by_name(&self, name: &str) -> StoreResult<Option<Permission>>;

    /// Insert an active permission. Fails with `Duplicate` if the name is taken.
    async fn insert_permission(&self, name: &str) -> StoreResult<Permission>;

    /// Rename a permission. Fails with `Duplicate` if another permission holds
    /// the name and with `Inactive` if the permission was deactivated.
    async fn rename_permission(&self, id: PermissionId, name: &str) -> StoreResult<Permission>;

    /// Mark a permission inactive. Role associations are kept.
    async fn deactivate_permission(&self, id: PermissionId) -> StoreResult<Deactivated<Permission>>;

    // ----- roles -----

    /// Page of roles passing the filter, with their permissions.
    async fn list_roles(
        &self,
        filter: LifecycleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<RoleWithPermissions>>;

    /// Every active role, unpaginated.
    async fn active_roles(&self) -> StoreResult<Vec<Role>>;

    /// Look up a role by id.
    async fn get_role(&self, id: RoleId) -> StoreResult<Option<RoleWithPermissions>>;

    /// Look up a role by exact name, active or not.
    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<RoleWithPermissions>>;

    /// Insert an active role with its permissions.
    async fn insert_role(
        &self,
        name: &str,
        permissions: &BTreeSet<PermissionId>,
    ) -> StoreResult<RoleWithPermissions>;

    /// Rename a role and sync its permissions to exactly `permissions`.
    ///
    /// Deactivation is terminal: an inactive role fails with `Inactive` and
    /// keeps its empty permission set.
    async fn update_role(
        &self,
        id: RoleId,
        name: &str,
        permissions: &BTreeSet<PermissionId>,
    ) -> StoreResult<Updated<RoleWithPermissions, PermissionId>>;

    /// Mark a role inactive and detach all of its permissions.
    async fn deactivate_role(&self, id: RoleId) -> StoreResult<Deactivated<RoleWithPermissions>>;

    // ----- users -----

    /// Page of users passing the filter, with their roles.
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Page<UserWithRoles>>;

    /// Look up a user by id.
    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserWithRoles>>;

    /// Look up a user by exact email, active or not.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserWithRoles>>;

    /// Insert an active user with its roles.
    async fn insert_user(
        &self,
        record: NewUserRecord,
        roles: &BTreeSet<RoleId>,
    ) -> StoreResult<UserWithRoles>;

    /// Apply profile changes and sync roles to exactly `roles`.
    ///
    /// An inactive user fails with `Inactive` and keeps its empty role set.
    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
        roles: &BTreeSet<RoleId>,
    ) -> StoreResult<Updated<UserWithRoles, RoleId>>;

    /// Mark a user inactive and detach all of its roles.
    async fn deactivate_user(&self, id: UserId) -> StoreResult<Deactivated<UserWithRoles>>;

    // ----- resolution -----

    /// A user with its roles and their permissions, read as one snapshot.
    async fn user_grants(&self, id: UserId) -> StoreResult<Option<UserGrants>>;
}
