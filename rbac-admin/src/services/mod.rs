//! Admin services
//!
//! One service per administered entity. Every operation takes the acting
//! user's id, checks the gate for its action before touching the store, and
//! returns either the result with a confirmation message or an [`AdminError`].

use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::config::AdminConfig;
use crate::error::AdminError;
use crate::resolver::AuthorizationResolver;
use crate::store::RbacStore;

pub mod permissions;
pub mod roles;
pub mod users;

pub use permissions::PermissionService;
pub use roles::RoleService;
pub use users::UserService;

/// Result of a successful mutation, with the message shown to the user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionOutcome<T> {
    /// The record after the operation
    pub data: T,
    /// Human-readable confirmation
    pub message: String,
}

impl<T> ActionOutcome<T> {
    pub(crate) fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

/// State shared by the three services.
#[derive(Clone)]
pub(crate) struct ServiceContext {
    pub store: Arc<dyn RbacStore>,
    pub resolver: AuthorizationResolver,
    pub config: Arc<AdminConfig>,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn RbacStore>, config: Arc<AdminConfig>) -> Self {
        Self {
            resolver: AuthorizationResolver::new(store.clone()),
            store,
            config,
        }
    }
}

/// Convert a failure into an [`AdminError`], logging server-side ones.
pub(crate) fn report<E: Into<AdminError>>(err: E) -> AdminError {
    let err = err.into();
    if err.is_server_error() {
        error!(error = %err, "Admin operation failed");
    }
    err
}
