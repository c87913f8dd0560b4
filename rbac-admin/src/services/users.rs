//! User administration
//!
//! Users own a set of roles. Passwords are hashed before they reach the
//! store; on update the stored hash is kept unless a new password is given.

use rbac_core::{Action, Resource};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{report, ActionOutcome, ServiceContext};
use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::models::{
    NewUser, NewUserRecord, RoleId, UserChanges, UserFilter, UserId, UserUpdate, UserWithRoles,
};
use crate::pagination::{Page, PageRequest};
use crate::password;
use crate::store::RbacStore;
use crate::validation::{self, ValidationErrors};

/// Create, update, list and deactivate users.
#[derive(Clone)]
pub struct UserService {
    ctx: ServiceContext,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("config", &self.ctx.config)
            .finish_non_exhaustive()
    }
}

impl UserService {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn RbacStore>, config: Arc<AdminConfig>) -> Self {
        Self {
            ctx: ServiceContext::new(store, config),
        }
    }

    pub(crate) fn from_context(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// One page of users matching `filter`, each with its roles.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn list(
        &self,
        actor: UserId,
        filter: &UserFilter,
        page: u32,
    ) -> AdminResult<Page<UserWithRoles>> {
        self.gate(actor, Action::Read).await?;
        let request = PageRequest::new(page, self.ctx.config.page_size);
        self.ctx
            .store
            .list_users(filter, request)
            .await
            .map_err(report)
    }

    /// Look up a user with its roles, active or not.
    #[instrument(skip(self), fields(actor = %actor, user_id = %id))]
    pub async fn get(&self, actor: UserId, id: UserId) -> AdminResult<UserWithRoles> {
        self.gate(actor, Action::Read).await?;
        self.ctx
            .store
            .get_user(id)
            .await
            .map_err(report)?
            .ok_or(AdminError::NotFound {
                resource: Resource::User,
                id: id.get(),
            })
    }

    /// Create an active user and assign its roles.
    ///
    /// # Errors
    ///
    /// `Validation` for a missing or malformed name, email or password, an
    /// email already held by any user, or unknown role ids.
    #[instrument(skip(self, input), fields(actor = %actor, email = %input.email))]
    pub async fn create(
        &self,
        actor: UserId,
        input: NewUser,
    ) -> AdminResult<ActionOutcome<UserWithRoles>> {
        self.gate(actor, Action::Create).await?;

        let mut errors = ValidationErrors::new();
        let profile = self.validate_profile(&mut errors, &input.name, &input.email);
        if validation::required(&mut errors, "password", &input.password).is_some() {
            validation::password(
                &mut errors,
                "password",
                &input.password,
                input.password_confirmation.as_deref(),
                self.ctx.config.password_min_len,
            );
        }
        let Some((name, email)) = profile.filter(|_| errors.is_empty()) else {
            return Err(errors.into());
        };

        let record = NewUserRecord {
            name,
            email,
            password_hash: password::hash_password(&input.password)?,
        };
        let roles: BTreeSet<RoleId> = input.role_ids.iter().copied().collect();
        debug!(roles = roles.len(), "Creating user");

        let user = self
            .ctx
            .store
            .insert_user(record, &roles)
            .await
            .map_err(report)?;
        info!(user_id = %user.user.id, "User created");
        Ok(ActionOutcome::new(user, "User created successfully"))
    }

    /// Update a user's profile and sync its roles to exactly `input.role_ids`.
    ///
    /// The password is re-hashed only when `input.password` is non-blank.
    #[instrument(skip(self, input), fields(actor = %actor, user_id = %id))]
    pub async fn update(
        &self,
        actor: UserId,
        id: UserId,
        input: UserUpdate,
    ) -> AdminResult<ActionOutcome<UserWithRoles>> {
        self.gate(actor, Action::Update).await?;

        let mut errors = ValidationErrors::new();
        let profile = self.validate_profile(&mut errors, &input.name, &input.email);
        let new_password = input.supplied_password();
        if let Some(password) = new_password {
            validation::password(
                &mut errors,
                "password",
                password,
                None,
                self.ctx.config.password_min_len,
            );
        }
        let Some((name, email)) = profile.filter(|_| errors.is_empty()) else {
            return Err(errors.into());
        };

        let password_hash = new_password.map(password::hash_password).transpose()?;
        let rotated = password_hash.is_some();
        let changes = UserChanges {
            name,
            email,
            password_hash,
        };
        let roles: BTreeSet<RoleId> = input.role_ids.iter().copied().collect();

        let updated = self
            .ctx
            .store
            .update_user(id, changes, &roles)
            .await
            .map_err(report)?;
        if updated.sync.is_noop() {
            debug!("Role set unchanged");
        }
        info!(
            password_rotated = rotated,
            attached = updated.sync.attach.len(),
            detached = updated.sync.detach.len(),
            "User updated"
        );
        Ok(ActionOutcome::new(updated.record, "User updated successfully"))
    }

    /// Mark a user inactive and detach all of its roles.
    #[instrument(skip(self), fields(actor = %actor, user_id = %id))]
    pub async fn deactivate(
        &self,
        actor: UserId,
        id: UserId,
    ) -> AdminResult<ActionOutcome<UserWithRoles>> {
        self.gate(actor, Action::Delete).await?;

        let result = self.ctx.store.deactivate_user(id).await.map_err(report)?;
        if result.changed {
            info!(detached = result.detached, "User deactivated");
        }
        Ok(ActionOutcome::new(result.record, "User deleted successfully"))
    }

    /// Trimmed name and email, or `None` after recording field errors.
    fn validate_profile(
        &self,
        errors: &mut ValidationErrors,
        name: &str,
        email: &str,
    ) -> Option<(String, String)> {
        let max = self.ctx.config.name_max_len;

        let name = validation::required(errors, "name", name)
            .filter(|name| validation::max_len(errors, "name", name, max));
        let email = validation::required(errors, "email", email)
            .filter(|email| validation::max_len(errors, "email", email, max))
            .filter(|email| validation::email(errors, "email", email));

        Some((name?.to_string(), email?.to_string()))
    }

    async fn gate(&self, actor: UserId, action: Action) -> AdminResult<()> {
        self.ctx
            .resolver
            .authorize(actor, action, Resource::User)
            .await
    }
}
