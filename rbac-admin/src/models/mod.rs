//! Domain models
//!
//! Permission, role and user records, their typed identifiers, and the
//! hydrated views (a role with its permissions, a user with its roles) that
//! stores return.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod permission;
pub mod role;
pub mod user;

pub use permission::Permission;
pub use role::{Role, RoleInput, RoleWithPermissions};
pub use user::{NewUser, NewUserRecord, User, UserChanges, UserFilter, UserGrants, UserUpdate, UserWithRoles};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Smallest possible id, used as a range bound.
            pub const MIN: Self = Self(0);
            /// Largest possible id, used as a range bound.
            pub const MAX: Self = Self(u64::MAX);

            /// Get the raw numeric id.
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`Permission`] row.
    PermissionId
);
record_id!(
    /// Identifier of a [`Role`] row.
    RoleId
);
record_id!(
    /// Identifier of a [`User`] row.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_numerically() {
        assert!(PermissionId(2) < PermissionId(10));
        assert!(RoleId::MIN <= RoleId(0));
        assert!(UserId(u64::MAX) == UserId::MAX);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_value(RoleId(7)).unwrap(), serde_json::json!(7));
        let id: UserId = serde_json::from_value(serde_json::json!(42)).unwrap();
        assert_eq!(id, UserId(42));
        assert_eq!(id.to_string(), "42");
    }
}
