//! Error types for admin operations
//!
//! Stores raise [`StoreError`](crate::store::StoreError); services convert it
//! into [`AdminError`], which is what the request layer sees.

use rbac_core::{Action, Resource};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::{self, ValidationErrors};

/// Admin operation error types.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Input was rejected; recoverable by fixing the listed fields
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The referenced record does not exist
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of record looked up
        resource: Resource,
        /// Requested id
        id: u64,
    },

    /// The acting user lacks the permission bound to the action
    #[error("Forbidden: not allowed to {action} {resource}")]
    Forbidden {
        /// Attempted action
        action: Action,
        /// Target record kind
        resource: Resource,
    },

    /// The storage backend failed; nothing was changed
    #[error("Store error: {0}")]
    Store(String),

    /// Internal failure outside the store (e.g. password hashing)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AdminError::Validation(ValidationErrors::single(field, message))
    }

    /// Check if this error should be logged at error level.
    ///
    /// Validation, not-found and forbidden outcomes are expected traffic.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AdminError::Store(_) | AdminError::Internal(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::Validation(_) => 422,
            AdminError::NotFound { .. } => 404,
            AdminError::Forbidden { .. } => 403,
            AdminError::Store(_) | AdminError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AdminError::Validation(_) => "VALIDATION_FAILED",
            AdminError::NotFound { .. } => "NOT_FOUND",
            AdminError::Forbidden { .. } => "FORBIDDEN",
            AdminError::Store(_) => "STORE_ERROR",
            AdminError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show the end user. Backend details are withheld.
    pub fn user_message(&self) -> String {
        match self {
            AdminError::Validation(_) => "The given data was invalid.".to_string(),
            AdminError::NotFound { resource, .. } => {
                format!("The requested {} was not found.", resource)
            }
            AdminError::Forbidden { .. } => "This action is unauthorized.".to_string(),
            AdminError::Store(_) | AdminError::Internal(_) => {
                "The operation failed. Please try again.".to_string()
            }
        }
    }

    /// Field errors, when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            AdminError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// JSON body for the request layer.
    pub fn to_response(&self) -> serde_json::Value {
        json!({
            "code": self.error_code(),
            "message": self.user_message(),
            "errors": self.validation_errors(),
        })
    }
}

impl From<ValidationErrors> for AdminError {
    fn from(errors: ValidationErrors) -> Self {
        AdminError::Validation(errors)
    }
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field, .. } => {
                AdminError::invalid(field, format!("The {} has already been taken.", field))
            }
            StoreError::MissingReferences { field, ids } => {
                AdminError::invalid(field, validation::invalid_ids_message(field, &ids))
            }
            StoreError::NotFound { resource, id } => AdminError::NotFound { resource, id },
            StoreError::Inactive { resource, id } => AdminError::invalid(
                "id",
                format!("{} {} is inactive and cannot be edited.", resource.display_name(), id),
            ),
            StoreError::Backend(message) => AdminError::Store(message),
        }
    }
}

impl From<argon2::password_hash::Error> for AdminError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AdminError::Internal(format!("password hashing failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AdminError::invalid("name", "x").status_code(), 422);
        assert_eq!(
            AdminError::NotFound { resource: Resource::Role, id: 3 }.status_code(),
            404
        );
        assert_eq!(
            AdminError::Forbidden { action: Action::Create, resource: Resource::User }.status_code(),
            403
        );
        assert_eq!(AdminError::Store("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_duplicate_maps_to_field_error() {
        let err: AdminError = StoreError::Duplicate { field: "name", value: "Leer".into() }.into();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.first("name"), Some("The name has already been taken."));
    }

    #[test]
    fn test_missing_references_lists_ids() {
        let err: AdminError = StoreError::MissingReferences { field: "role_ids", ids: vec![4, 8] }.into();
        assert_eq!(
            err.validation_errors().unwrap().first("role_ids"),
            Some("The selected role_ids are invalid: 4, 8.")
        );
    }

    #[test]
    fn test_inactive_maps_to_id_error() {
        let err: AdminError = StoreError::Inactive { resource: Resource::User, id: 7 }.into();
        assert_eq!(err.status_code(), 422);
        assert_eq!(
            err.validation_errors().unwrap().first("id"),
            Some("User 7 is inactive and cannot be edited.")
        );
    }

    #[test]
    fn test_backend_details_are_not_shown() {
        let err: AdminError = StoreError::Backend("connection reset".into()).into();
        assert!(err.is_server_error());
        assert!(!err.user_message().contains("connection"));
        let body = err.to_response();
        assert_eq!(body["code"], "STORE_ERROR");
        assert!(body["errors"].is_null());
    }

    #[test]
    fn test_forbidden_response() {
        let err = AdminError::Forbidden { action: Action::Delete, resource: Resource::Permission };
        assert!(!err.is_server_error());
        assert_eq!(err.to_string(), "Forbidden: not allowed to delete permission");
        assert_eq!(err.to_response()["message"], "This action is unauthorized.");
    }
}
