//! # Actions
//!
//! Defines the administrative actions guarded by the authorization gate.
//! Each action is bound to exactly one canonical permission name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative actions that require a named permission.
///
/// Every admin operation maps onto one of these:
/// - **Read**: listings, single-record lookups and form option lists
/// - **Create**: creating a new record
/// - **Update**: editing an existing record, including association sync
/// - **Delete**: deactivating a record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read/list records.
    ///
    /// Grants access to listings and record details.
    Read,

    /// Create new records.
    Create,

    /// Update existing records.
    ///
    /// Also covers replacing a record's association set.
    Update,

    /// Delete (deactivate) records.
    ///
    /// Records are never removed; deletion is a lifecycle transition.
    Delete,
}

impl Action {
    /// Get the string representation of the action.
    ///
    /// # Returns
    ///
    /// A static string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Get the canonical permission name a user must hold to perform this action.
    ///
    /// # Example
    ///
    /// ```
    /// use rbac_core::actions::Action;
    ///
    /// assert_eq!(Action::Read.permission_name(), "Leer");
    /// assert_eq!(Action::Delete.permission_name(), "Eliminar");
    /// ```
    pub fn permission_name(&self) -> &'static str {
        match self {
            Action::Read => "Leer",
            Action::Create => "Crear",
            Action::Update => "Editar",
            Action::Delete => "Eliminar",
        }
    }

    /// Parse action from string representation.
    ///
    /// Accepts English and Spanish aliases so legacy gate names such as
    /// `Lectura` map onto the canonical set.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive, supports aliases)
    ///
    /// # Returns
    ///
    /// `Some(Action)` if valid, `None` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use rbac_core::actions::Action;
    ///
    /// assert_eq!(Action::parse("read"), Some(Action::Read));
    /// assert_eq!(Action::parse("Lectura"), Some(Action::Read));
    /// assert_eq!(Action::parse("editar"), Some(Action::Update));
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "read" | "view" | "get" | "list" | "index" | "leer" | "lectura" | "ver" => {
                Some(Action::Read)
            }
            "create" | "add" | "new" | "store" | "crear" => Some(Action::Create),
            "update" | "edit" | "write" | "modify" | "editar" | "actualizar" => {
                Some(Action::Update)
            }
            "delete" | "remove" | "destroy" | "deactivate" | "eliminar" | "borrar" => {
                Some(Action::Delete)
            }
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![Action::Read, Action::Create, Action::Update, Action::Delete]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
