//! # RBAC Admin
//!
//! User, role and permission administration with per-request authorization.
//!
//! ## Overview
//!
//! The rbac-admin crate handles:
//! - **Permissions**: Named grants, unique across active and inactive records
//! - **Roles**: Named sets of permissions, synced as a whole on update
//! - **Users**: Accounts with hashed passwords and a set of roles
//! - **Authorization**: Effective permissions resolved on every request
//! - **Seeding**: Canonical permissions and a first administrator
//!
//! Nothing is ever hard-deleted. Deactivating a role detaches its
//! permissions; deactivating a user detaches its roles.
//!
//! ## Architecture
//!
//! ```text
//! request (actor id, parsed input)
//!   └─ RbacAdmin
//!        ├─ PermissionService ─┐
//!        ├─ RoleService ───────┼─ AuthorizationResolver (gate) ─┐
//!        └─ UserService ───────┘                                ├─ RbacStore
//!                                                               │    └─ MemoryStore
//!        User ──< user_roles >── Role ──< role_permissions >── Permission
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rbac_admin::{AdminConfig, RbacAdmin, RoleInput};
//! use rbac_admin::seed::{bootstrap, AdminSeed};
//!
//! # async fn example() -> Result<(), rbac_admin::AdminError> {
//! let admin = RbacAdmin::in_memory(AdminConfig::default());
//! let seeded = bootstrap(
//!     admin.store().as_ref(),
//!     admin.config(),
//!     &AdminSeed::new("Root", "root@example.com", "change-me-now"),
//! )
//! .await?;
//! let actor = seeded.admin.user.id;
//!
//! let outcome = admin.roles().create(actor, RoleInput::new("Editor")).await?;
//! println!("{}", outcome.message);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `memory`: In-memory store backend (enabled by default)

pub mod admin;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod password;
pub mod resolver;
pub mod seed;
pub mod services;
pub mod store;
pub mod sync;
pub mod validation;

// Re-export main types for convenience
pub use admin::RbacAdmin;
pub use config::{AdminConfig, ConfigError};
pub use error::{AdminError, AdminResult};
pub use models::{
    NewUser, Permission, PermissionId, Role, RoleId, RoleInput, RoleWithPermissions, User,
    UserFilter, UserId, UserUpdate, UserWithRoles,
};
pub use pagination::{Page, PageRequest};
pub use resolver::AuthorizationResolver;
pub use services::{ActionOutcome, PermissionService, RoleService, UserService};
pub use store::{RbacStore, StoreError};

#[cfg(feature = "memory")]
pub use store::MemoryStore;

pub use rbac_core::{Action, Lifecycle, LifecycleFilter, PermissionSet, Resource};
