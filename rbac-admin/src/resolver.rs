//! Authorization resolver
//!
//! Answers "may this user perform this action" by deriving the user's
//! effective permissions from the store on every call. Nothing is cached, so
//! role and permission edits apply to the very next request.

use rbac_core::{Action, PermissionSet, Resource};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{AdminError, AdminResult};
use crate::models::{UserGrants, UserId};
use crate::store::RbacStore;

/// Per-request permission resolution and gate checks.
#[derive(Clone)]
pub struct AuthorizationResolver {
    store: Arc<dyn RbacStore>,
}

impl std::fmt::Debug for AuthorizationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationResolver").finish_non_exhaustive()
    }
}

impl AuthorizationResolver {
    /// Create a resolver reading from `store`.
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    /// Permission names reachable from the user through its active roles.
    ///
    /// Unknown and inactive users resolve to an empty set.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn effective_permissions(&self, user: UserId) -> AdminResult<PermissionSet> {
        let grants = self.store.user_grants(user).await?;
        let permissions = grants.as_ref().map(collect_grants).unwrap_or_default();
        debug!(permissions = ?permissions.names(), "Resolved effective permissions");
        Ok(permissions)
    }

    /// Check if the user holds the named permission.
    pub async fn has_permission(&self, user: UserId, name: &str) -> AdminResult<bool> {
        Ok(self.effective_permissions(user).await?.has(name))
    }

    /// Check if the user may perform an action.
    pub async fn can(&self, user: UserId, action: Action) -> AdminResult<bool> {
        Ok(self.effective_permissions(user).await?.allows(action))
    }

    /// Gate an action on a resource.
    ///
    /// # Errors
    ///
    /// `Forbidden` when the user lacks the permission bound to `action`.
    #[instrument(skip(self), fields(actor = %actor, action = %action, resource = %resource))]
    pub async fn authorize(
        &self,
        actor: UserId,
        action: Action,
        resource: Resource,
    ) -> AdminResult<()> {
        if self.can(actor, action).await? {
            return Ok(());
        }
        warn!(
            permission = action.permission_name(),
            "Denied {} on {}", action, resource
        );
        Err(AdminError::Forbidden { action, resource })
    }
}

fn collect_grants(grants: &UserGrants) -> PermissionSet {
    if !grants.user.is_active() {
        return PermissionSet::new();
    }
    let mut set = PermissionSet::new();
    for role in grants.roles.iter().filter(|r| r.role.is_active()) {
        set.merge(&role.permission_names());
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUserRecord, PermissionId, RoleId};
    use crate::store::MemoryStore;
    use std::collections::BTreeSet;

    async fn setup() -> (Arc<MemoryStore>, AuthorizationResolver) {
        let store = Arc::new(MemoryStore::new());
        for name in ["Leer", "Crear", "Editar", "Eliminar"] {
            store.insert_permission(name).await.unwrap();
        }
        let resolver = AuthorizationResolver::new(store.clone());
        (store, resolver)
    }

    async fn user_with_roles(store: &MemoryStore, email: &str, roles: &[RoleId]) -> UserId {
        let record = NewUserRecord {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        };
        store
            .insert_user(record, &roles.iter().copied().collect())
            .await
            .unwrap()
            .user
            .id
    }

    fn perms(ids: &[u64]) -> BTreeSet<PermissionId> {
        ids.iter().copied().map(PermissionId).collect()
    }

    #[tokio::test]
    async fn test_union_of_active_roles() {
        let (store, resolver) = setup().await;
        let reader = store.insert_role("Lector", &perms(&[1])).await.unwrap().role.id;
        let writer = store.insert_role("Escritor", &perms(&[1, 2, 3])).await.unwrap().role.id;
        let user = user_with_roles(&store, "a@example.com", &[reader, writer]).await;

        let effective = resolver.effective_permissions(user).await.unwrap();
        assert_eq!(effective, PermissionSet::from_iter(["Leer", "Crear", "Editar"]));
        assert!(resolver.can(user, Action::Update).await.unwrap());
        assert!(!resolver.can(user, Action::Delete).await.unwrap());
    }

    #[tokio::test]
    async fn test_deactivated_role_is_dropped_on_next_resolution() {
        let (store, resolver) = setup().await;
        let reader = store.insert_role("Lector", &perms(&[1])).await.unwrap().role.id;
        let remover = store.insert_role("Borrador", &perms(&[4])).await.unwrap().role.id;
        let user = user_with_roles(&store, "a@example.com", &[reader, remover]).await;

        assert!(resolver.has_permission(user, "Eliminar").await.unwrap());
        store.deactivate_role(remover).await.unwrap();
        assert!(!resolver.has_permission(user, "Eliminar").await.unwrap());
        assert!(resolver.has_permission(user, "Leer").await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_and_unknown_users_have_nothing() {
        let (store, resolver) = setup().await;
        let all = store.insert_role("Todo", &perms(&[1, 2, 3, 4])).await.unwrap().role.id;
        let user = user_with_roles(&store, "a@example.com", &[all]).await;
        store.deactivate_user(user).await.unwrap();

        assert!(resolver.effective_permissions(user).await.unwrap().is_empty());
        assert!(resolver.effective_permissions(UserId(404)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authorize_forbidden() {
        let (store, resolver) = setup().await;
        let user = user_with_roles(&store, "a@example.com", &[]).await;

        let err = resolver
            .authorize(user, Action::Create, Resource::Role)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::Forbidden { action: Action::Create, resource: Resource::Role }
        ));
    }
}
