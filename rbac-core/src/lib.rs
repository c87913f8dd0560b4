//! # RBAC Core
//!
//! Shared vocabulary for the RBAC admin module: the gate actions, the
//! administered resources, record lifecycles and permission name sets.
//!
//! ## Overview
//!
//! - **Actions**: Read, Create, Update, Delete, each bound to one canonical
//!   permission name
//! - **Resources**: Permission, Role, User
//! - **Lifecycle**: Active → Inactive, the soft-delete state machine
//! - **Permission Sets**: name sets unioned across a user's active roles
//!
//! ## Architecture
//!
//! ```text
//! User ──< UserRole >── Role ──< RolePermission >── Permission
//!
//! effective_permissions(user) = ⋃ { names(role) | role ∈ roles(user), role active }
//! ```
//!
//! ## Gate Names
//!
//! | Action | Permission name |
//! |--------|-----------------|
//! | Read   | `Leer`          |
//! | Create | `Crear`         |
//! | Update | `Editar`        |
//! | Delete | `Eliminar`      |
//!
//! ## Usage
//!
//! ```rust
//! use rbac_core::{Action, PermissionSet};
//!
//! let editor: PermissionSet = ["Leer", "Editar"].into_iter().collect();
//! let auditor: PermissionSet = ["Leer"].into_iter().collect();
//!
//! let mut effective = PermissionSet::new();
//! effective.merge(&editor);
//! effective.merge(&auditor);
//!
//! assert_eq!(effective.len(), 2);
//! assert!(effective.allows(Action::Update));
//! assert!(!effective.allows(Action::Delete));
//! ```

pub mod actions;
pub mod lifecycle;
pub mod permissions;
pub mod resources;

// Re-export main types for convenience
pub use actions::Action;
pub use lifecycle::{Lifecycle, LifecycleFilter};
pub use permissions::PermissionSet;
pub use resources::Resource;
