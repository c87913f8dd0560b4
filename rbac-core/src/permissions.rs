//! # Permissions
//!
//! Permission name sets. A user's effective permissions are the union of the
//! permission sets of their active roles; this module provides that union and
//! the membership checks the gate is built on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::actions::Action;

/// A set of permission names.
///
/// Names are compared exactly. Duplicates collapse on insertion, so merging
/// the sets of several roles yields each name once.
///
/// # Example
///
/// ```
/// use rbac_core::permissions::PermissionSet;
/// use rbac_core::actions::Action;
///
/// let mut set = PermissionSet::new();
/// set.add("Leer");
/// set.add("Crear");
///
/// assert!(set.has("Leer"));
/// assert!(set.allows(Action::Create));
/// assert!(!set.allows(Action::Delete));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    names: BTreeSet<String>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Add a permission name to the set.
    ///
    /// # Returns
    ///
    /// `true` if the name was not already present
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Add multiple permission names to the set.
    pub fn add_all<I, N>(&mut self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        for name in names {
            self.add(name);
        }
    }

    /// Check if the set contains a permission name.
    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Check if the set grants the permission bound to a gate action.
    pub fn allows(&self, action: Action) -> bool {
        self.has(action.permission_name())
    }

    /// Merge another permission set into this one (set union).
    pub fn merge(&mut self, other: &PermissionSet) {
        for name in &other.names {
            self.names.insert(name.clone());
        }
    }

    /// Get all names in ascending order.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// Get the count of permission names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<N: Into<String>> FromIterator<N> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = N>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        set.add_all(iter);
        set
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_set() {
        let mut set = PermissionSet::new();
        assert!(set.add("Leer"));
        assert!(set.add("Crear"));
        assert!(!set.add("Leer"));

        assert!(set.has("Leer"));
        assert!(set.has("Crear"));
        assert!(!set.has("Eliminar"));
        assert!(!set.has("leer"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_permission_set_merge_collapses_duplicates() {
        let mut set1: PermissionSet = ["Leer", "Editar"].into_iter().collect();
        let set2: PermissionSet = ["Editar", "Crear"].into_iter().collect();

        set1.merge(&set2);
        assert_eq!(set1.names(), vec!["Crear", "Editar", "Leer"]);
    }

    #[test]
    fn test_permission_set_allows() {
        let set: PermissionSet = ["Leer", "Eliminar"].into_iter().collect();
        assert!(set.allows(Action::Read));
        assert!(set.allows(Action::Delete));
        assert!(!set.allows(Action::Create));
        assert!(!set.allows(Action::Update));
    }

    #[test]
    fn test_permission_set_serializes_as_list() {
        let set: PermissionSet = ["Leer", "Crear"].into_iter().collect();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!(["Crear", "Leer"]));
    }
}
