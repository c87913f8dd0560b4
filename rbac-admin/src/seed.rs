//! Bootstrap seeding
//!
//! A fresh store has no user able to pass any gate. [`bootstrap`] creates the
//! four canonical permissions, an administrator role holding them and a first
//! administrator account. It writes straight to the store and is safe to run
//! on every start.

use rbac_core::Action;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::models::{NewUserRecord, Permission, RoleWithPermissions, UserChanges, UserWithRoles};
use crate::password;
use crate::services::report;
use crate::store::RbacStore;
use crate::validation::{self, ValidationErrors};

/// Name of the seeded administrator role.
pub const ADMIN_ROLE: &str = "Administrador";

/// Credentials for the first administrator.
#[derive(Clone)]
pub struct AdminSeed {
    /// Display name
    pub name: String,
    /// Login email (lowercase)
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AdminSeed {
    /// Create seed credentials.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// What [`bootstrap`] found or created.
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    /// The canonical permissions, in action order
    pub permissions: Vec<Permission>,
    /// The administrator role
    pub role: RoleWithPermissions,
    /// The administrator account
    pub admin: UserWithRoles,
    /// Number of permissions inserted by this run
    pub permissions_created: usize,
    /// Whether this run inserted the role
    pub role_created: bool,
    /// Whether this run inserted the account
    pub admin_created: bool,
}

/// Ensure the canonical permissions, the administrator role and the first
/// administrator exist.
///
/// Existing records are reused. An existing administrator role gains any
/// canonical permission it lacks and keeps the rest. An existing account is
/// left as is apart from being given the role.
///
/// # Errors
///
/// A validation error when the seed is malformed or when the administrator
/// role or account exists but was deactivated. Nothing is written in either
/// case.
#[instrument(skip(store, config, seed), fields(email = %seed.email))]
pub async fn bootstrap(
    store: &dyn RbacStore,
    config: &AdminConfig,
    seed: &AdminSeed,
) -> AdminResult<SeedReport> {
    let mut errors = ValidationErrors::new();
    if let Some(email) = validation::required(&mut errors, "email", &seed.email) {
        validation::email(&mut errors, "email", email);
    }
    validation::required(&mut errors, "name", &seed.name);
    validation::password(&mut errors, "password", &seed.password, None, config.password_min_len);
    errors.check()?;

    // An inactive role or account stops the run before any write.
    let email = seed.email.trim();
    let existing_role = store.find_role_by_name(ADMIN_ROLE).await.map_err(report)?;
    if existing_role.as_ref().is_some_and(|r| !r.role.is_active()) {
        warn!(role = ADMIN_ROLE, "Administrator role is inactive");
        return Err(AdminError::invalid(
            "role",
            format!("The {} role is inactive and cannot be reused.", ADMIN_ROLE),
        ));
    }
    let existing_admin = store.find_user_by_email(email).await.map_err(report)?;
    if existing_admin.as_ref().is_some_and(|u| !u.user.is_active()) {
        warn!("Administrator account is inactive");
        return Err(AdminError::invalid(
            "email",
            "The administrator account is inactive and cannot be reused.",
        ));
    }

    let mut permissions = Vec::new();
    let mut permissions_created = 0;
    for action in Action::all() {
        let name = action.permission_name();
        let permission = match store.find_permission_by_name(name).await.map_err(report)? {
            Some(existing) => existing,
            None => {
                permissions_created += 1;
                store.insert_permission(name).await.map_err(report)?
            }
        };
        permissions.push(permission);
    }
    let canonical: BTreeSet<_> = permissions.iter().map(|p| p.id).collect();

    let (role, role_created) = match existing_role {
        Some(existing) if canonical.is_subset(&existing.permission_ids()) => (existing, false),
        Some(existing) => {
            let wanted: BTreeSet<_> = canonical.union(&existing.permission_ids()).copied().collect();
            let updated = store
                .update_role(existing.role.id, ADMIN_ROLE, &wanted)
                .await
                .map_err(report)?;
            (updated.record, false)
        }
        None => (
            store.insert_role(ADMIN_ROLE, &canonical).await.map_err(report)?,
            true,
        ),
    };

    let (admin, admin_created) = match existing_admin {
        Some(existing) if existing.role_ids().contains(&role.role.id) => (existing, false),
        Some(existing) => {
            let mut roles = existing.role_ids();
            roles.insert(role.role.id);
            let changes = UserChanges {
                name: existing.user.name.clone(),
                email: existing.user.email.clone(),
                password_hash: None,
            };
            let updated = store
                .update_user(existing.user.id, changes, &roles)
                .await
                .map_err(report)?;
            (updated.record, false)
        }
        None => {
            let record = NewUserRecord {
                name: seed.name.trim().to_string(),
                email: email.to_string(),
                password_hash: password::hash_password(&seed.password)?,
            };
            let created = store
                .insert_user(record, &BTreeSet::from([role.role.id]))
                .await
                .map_err(report)?;
            (created, true)
        }
    };

    info!(
        permissions_created,
        role_created, admin_created, "Bootstrap complete"
    );
    Ok(SeedReport {
        permissions,
        role,
        admin,
        permissions_created,
        role_created,
        admin_created,
    })
}
