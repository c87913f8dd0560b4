//! Admin facade
//!
//! Wires one store, one resolver and the three services together so the
//! request layer holds a single handle.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::resolver::AuthorizationResolver;
use crate::services::{PermissionService, RoleService, ServiceContext, UserService};
use crate::store::RbacStore;

/// Entry point to the admin module.
///
/// # Examples
///
/// ```
/// use rbac_admin::{AdminConfig, RbacAdmin};
///
/// let admin = RbacAdmin::in_memory(AdminConfig::default());
/// assert_eq!(admin.config().page_size, 5);
/// ```
#[derive(Clone)]
pub struct RbacAdmin {
    ctx: ServiceContext,
    permissions: PermissionService,
    roles: RoleService,
    users: UserService,
}

impl std::fmt::Debug for RbacAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RbacAdmin")
            .field("config", &self.ctx.config)
            .finish_non_exhaustive()
    }
}

impl RbacAdmin {
    /// Build the admin module over an existing store.
    pub fn new(store: Arc<dyn RbacStore>, config: AdminConfig) -> Self {
        let ctx = ServiceContext::new(store, Arc::new(config));
        Self {
            permissions: PermissionService::from_context(ctx.clone()),
            roles: RoleService::from_context(ctx.clone()),
            users: UserService::from_context(ctx.clone()),
            ctx,
        }
    }

    /// Build the admin module over a fresh [`MemoryStore`](crate::store::MemoryStore).
    #[cfg(feature = "memory")]
    pub fn in_memory(config: AdminConfig) -> Self {
        Self::new(Arc::new(crate::store::MemoryStore::new()), config)
    }

    /// Permission administration.
    pub fn permissions(&self) -> &PermissionService {
        &self.permissions
    }

    /// Role administration.
    pub fn roles(&self) -> &RoleService {
        &self.roles
    }

    /// User administration.
    pub fn users(&self) -> &UserService {
        &self.users
    }

    /// Gate checks and effective permission lookups.
    pub fn resolver(&self) -> &AuthorizationResolver {
        &self.ctx.resolver
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn RbacStore> {
        &self.ctx.store
    }

    /// Active configuration.
    pub fn config(&self) -> &AdminConfig {
        &self.ctx.config
    }
}
