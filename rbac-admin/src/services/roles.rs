//! Role administration
//!
//! Roles own a set of permissions. Create attaches the submitted set, update
//! syncs to it, and deactivation detaches every permission.

use rbac_core::{Action, LifecycleFilter, Resource};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{report, ActionOutcome, ServiceContext};
use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::models::{Role, RoleId, RoleInput, RoleWithPermissions, UserId};
use crate::pagination::{Page, PageRequest};
use crate::store::RbacStore;
use crate::validation::{self, ValidationErrors};

/// Create, update, list and deactivate roles.
#[derive(Clone)]
pub struct RoleService {
    ctx: ServiceContext,
}

impl std::fmt::Debug for RoleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleService")
            .field("config", &self.ctx.config)
            .finish_non_exhaustive()
    }
}

impl RoleService {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn RbacStore>, config: Arc<AdminConfig>) -> Self {
        Self {
            ctx: ServiceContext::new(store, config),
        }
    }

    pub(crate) fn from_context(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// One page of active roles with their permissions.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn list_active_with_permissions(
        &self,
        actor: UserId,
        page: u32,
    ) -> AdminResult<Page<RoleWithPermissions>> {
        self.gate(actor, Action::Read).await?;
        let request = PageRequest::new(page, self.ctx.config.page_size);
        self.ctx
            .store
            .list_roles(LifecycleFilter::ActiveOnly, request)
            .await
            .map_err(report)
    }

    /// Every active role, for user form option lists.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn assignable(&self, actor: UserId) -> AdminResult<Vec<Role>> {
        self.gate(actor, Action::Read).await?;
        self.ctx.store.active_roles().await.map_err(report)
    }

    /// Look up a role with its permissions, active or not.
    #[instrument(skip(self), fields(actor = %actor, role_id = %id))]
    pub async fn get(&self, actor: UserId, id: RoleId) -> AdminResult<RoleWithPermissions> {
        self.gate(actor, Action::Read).await?;
        self.ctx
            .store
            .get_role(id)
            .await
            .map_err(report)?
            .ok_or(AdminError::NotFound {
                resource: Resource::Role,
                id: id.get(),
            })
    }

    /// Create an active role and attach its permissions.
    ///
    /// # Errors
    ///
    /// `Validation` if the name is blank, too long or taken, or if any
    /// permission id references no permission.
    #[instrument(skip(self, input), fields(actor = %actor, name = %input.name))]
    pub async fn create(
        &self,
        actor: UserId,
        input: RoleInput,
    ) -> AdminResult<ActionOutcome<RoleWithPermissions>> {
        self.gate(actor, Action::Create).await?;
        let name = self.validate_name(&input.name)?;
        let permissions = input.permission_set();
        debug!(permissions = permissions.len(), "Creating role");

        let role = self
            .ctx
            .store
            .insert_role(name, &permissions)
            .await
            .map_err(report)?;
        info!(role_id = %role.role.id, "Role created");
        Ok(ActionOutcome::new(role, "Role created successfully"))
    }

    /// Rename a role and sync its permissions to exactly `input.permission_ids`.
    #[instrument(skip(self, input), fields(actor = %actor, role_id = %id))]
    pub async fn update(
        &self,
        actor: UserId,
        id: RoleId,
        input: RoleInput,
    ) -> AdminResult<ActionOutcome<RoleWithPermissions>> {
        self.gate(actor, Action::Update).await?;
        let name = self.validate_name(&input.name)?;

        let updated = self
            .ctx
            .store
            .update_role(id, name, &input.permission_set())
            .await
            .map_err(report)?;
        if updated.sync.is_noop() {
            debug!("Permission set unchanged");
        }
        info!(
            attached = updated.sync.attach.len(),
            detached = updated.sync.detach.len(),
            "Role updated"
        );
        Ok(ActionOutcome::new(updated.record, "Role updated successfully"))
    }

    /// Mark a role inactive and detach all of its permissions.
    ///
    /// The permissions themselves are untouched. Repeating the call is a
    /// no-op.
    #[instrument(skip(self), fields(actor = %actor, role_id = %id))]
    pub async fn deactivate(
        &self,
        actor: UserId,
        id: RoleId,
    ) -> AdminResult<ActionOutcome<RoleWithPermissions>> {
        self.gate(actor, Action::Delete).await?;

        let result = self.ctx.store.deactivate_role(id).await.map_err(report)?;
        if result.changed {
            info!(detached = result.detached, "Role deactivated");
        }
        Ok(ActionOutcome::new(result.record, "Role deleted successfully"))
    }

    fn validate_name<'a>(&self, name: &'a str) -> AdminResult<&'a str> {
        let mut errors = ValidationErrors::new();
        let Some(name) = validation::required(&mut errors, "name", name) else {
            return Err(errors.into());
        };
        validation::max_len(&mut errors, "name", name, self.ctx.config.name_max_len);
        errors.check()?;
        Ok(name)
    }

    async fn gate(&self, actor: UserId, action: Action) -> AdminResult<()> {
        self.ctx
            .resolver
            .authorize(actor, action, Resource::Role)
            .await
    }
}
