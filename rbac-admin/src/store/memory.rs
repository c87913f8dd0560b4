//! In-memory store
//!
//! All tables live behind one `tokio::sync::RwLock`. Each trait method takes
//! the lock once, so every operation is a transaction: writers are
//! serialised, and a reader sees an association set either entirely before or
//! entirely after a sync.

use async_trait::async_trait;
use rbac_core::{LifecycleFilter, Resource};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use super::{Deactivated, RbacStore, StoreError, StoreResult, Updated};
use crate::models::{
    NewUserRecord, Permission, PermissionId, Role, RoleId, RoleWithPermissions, User, UserChanges,
    UserFilter, UserGrants, UserId, UserWithRoles,
};
use crate::pagination::{Page, PageRequest};
use crate::sync::SyncPlan;

#[derive(Debug, Default)]
struct Tables {
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, Role>,
    users: BTreeMap<UserId, User>,
    role_permissions: BTreeSet<(RoleId, PermissionId)>,
    user_roles: BTreeSet<(UserId, RoleId)>,
    last_permission_id: u64,
    last_role_id: u64,
    last_user_id: u64,
}

impl Tables {
    fn permission_ids_of(&self, role: RoleId) -> BTreeSet<PermissionId> {
        self.role_permissions
            .range((role, PermissionId::MIN)..=(role, PermissionId::MAX))
            .map(|(_, permission)| *permission)
            .collect()
    }

    fn role_ids_of(&self, user: UserId) -> BTreeSet<RoleId> {
        self.user_roles
            .range((user, RoleId::MIN)..=(user, RoleId::MAX))
            .map(|(_, role)| *role)
            .collect()
    }

    fn role_view(&self, role: &Role) -> RoleWithPermissions {
        let permissions = self
            .permission_ids_of(role.id)
            .into_iter()
            .filter_map(|id| self.permissions.get(&id).cloned())
            .collect();
        RoleWithPermissions {
            role: role.clone(),
            permissions,
        }
    }

    fn user_view(&self, user: &User) -> UserWithRoles {
        let roles = self
            .role_ids_of(user.id)
            .into_iter()
            .filter_map(|id| self.roles.get(&id).cloned())
            .collect();
        UserWithRoles {
            user: user.clone(),
            roles,
        }
    }

    fn role_view_by_id(&self, id: RoleId) -> StoreResult<RoleWithPermissions> {
        self.roles
            .get(&id)
            .map(|role| self.role_view(role))
            .ok_or_else(|| not_found(Resource::Role, id.get()))
    }

    fn user_view_by_id(&self, id: UserId) -> StoreResult<UserWithRoles> {
        self.users
            .get(&id)
            .map(|user| self.user_view(user))
            .ok_or_else(|| not_found(Resource::User, id.get()))
    }

    fn check_permission_refs(&self, ids: &BTreeSet<PermissionId>) -> StoreResult<()> {
        let missing: Vec<u64> = ids
            .iter()
            .filter(|id| !self.permissions.contains_key(id))
            .map(|id| id.get())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::MissingReferences {
                field: "permission_ids",
                ids: missing,
            })
        }
    }

    fn check_role_refs(&self, ids: &BTreeSet<RoleId>) -> StoreResult<()> {
        let missing: Vec<u64> = ids
            .iter()
            .filter(|id| !self.roles.contains_key(id))
            .map(|id| id.get())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::MissingReferences {
                field: "role_ids",
                ids: missing,
            })
        }
    }

    fn check_permission_name(&self, name: &str, except: Option<PermissionId>) -> StoreResult<()> {
        let taken = self
            .permissions
            .values()
            .any(|p| p.name == name && Some(p.id) != except);
        unique(taken, "name", name)
    }

    fn check_role_name(&self, name: &str, except: Option<RoleId>) -> StoreResult<()> {
        let taken = self
            .roles
            .values()
            .any(|r| r.name == name && Some(r.id) != except);
        unique(taken, "name", name)
    }

    fn check_email(&self, email: &str, except: Option<UserId>) -> StoreResult<()> {
        let taken = self
            .users
            .values()
            .any(|u| u.email == email && Some(u.id) != except);
        unique(taken, "email", email)
    }
}

fn unique(taken: bool, field: &'static str, value: &str) -> StoreResult<()> {
    if taken {
        Err(StoreError::Duplicate {
            field,
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}

fn not_found(resource: Resource, id: u64) -> StoreError {
    StoreError::NotFound { resource, id }
}

fn ensure_active(active: bool, resource: Resource, id: u64) -> StoreResult<()> {
    if active {
        Ok(())
    } else {
        Err(StoreError::Inactive { resource, id })
    }
}

/// In-memory store implementation.
///
/// Suitable for single-process deployments and tests. Ids are assigned from
/// per-table counters starting at 1 and are never reused.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RbacStore for MemoryStore {
    async fn list_permissions(
        &self,
        filter: LifecycleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Permission>> {
        let tables = self.tables.read().await;
        let matching: Vec<&Permission> = tables
            .permissions
            .values()
            .filter(|p| filter.matches(p.lifecycle))
            .collect();
        Ok(Page::slice(matching, page).map(Permission::clone))
    }

    async fn active_permissions(&self) -> StoreResult<Vec<Permission>> {
        let tables = self.tables.read().await;
        Ok(tables
            .permissions
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect())
    }

    async fn get_permission(&self, id: PermissionId) -> StoreResult<Option<Permission>> {
        Ok(self.tables.read().await.permissions.get(&id).cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> StoreResult<Option<Permission>> {
        let tables = self.tables.read().await;
        Ok(tables.permissions.values().find(|p| p.name == name).cloned())
    }

    async fn insert_permission(&self, name: &str) -> StoreResult<Permission> {
        let mut tables = self.tables.write().await;
        tables.check_permission_name(name, None)?;

        tables.last_permission_id += 1;
        let permission = Permission::new(PermissionId(tables.last_permission_id), name);
        tables.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn rename_permission(&self, id: PermissionId, name: &str) -> StoreResult<Permission> {
        let mut tables = self.tables.write().await;
        let active = tables
            .permissions
            .get(&id)
            .ok_or_else(|| not_found(Resource::Permission, id.get()))?
            .is_active();
        ensure_active(active, Resource::Permission, id.get())?;
        tables.check_permission_name(name, Some(id))?;

        let permission = tables
            .permissions
            .get_mut(&id)
            .ok_or_else(|| not_found(Resource::Permission, id.get()))?;
        permission.rename(name);
        Ok(permission.clone())
    }

    async fn deactivate_permission(&self, id: PermissionId) -> StoreResult<Deactivated<Permission>> {
        let mut tables = self.tables.write().await;
        let permission = tables
            .permissions
            .get_mut(&id)
            .ok_or_else(|| not_found(Resource::Permission, id.get()))?;
        let changed = permission.deactivate();
        Ok(Deactivated {
            record: permission.clone(),
            changed,
            detached: 0,
        })
    }

    async fn list_roles(
        &self,
        filter: LifecycleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<RoleWithPermissions>> {
        let tables = self.tables.read().await;
        let matching: Vec<&Role> = tables
            .roles
            .values()
            .filter(|r| filter.matches(r.lifecycle))
            .collect();
        Ok(Page::slice(matching, page).map(|role| tables.role_view(role)))
    }

    async fn active_roles(&self) -> StoreResult<Vec<Role>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .filter(|r| r.is_active())
            .cloned()
            .collect())
    }

    async fn get_role(&self, id: RoleId) -> StoreResult<Option<RoleWithPermissions>> {
        let tables = self.tables.read().await;
        Ok(tables.roles.get(&id).map(|role| tables.role_view(role)))
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<RoleWithPermissions>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .find(|r| r.name == name)
            .map(|role| tables.role_view(role)))
    }

    async fn insert_role(
        &self,
        name: &str,
        permissions: &BTreeSet<PermissionId>,
    ) -> StoreResult<RoleWithPermissions> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        tables.check_role_name(name, None)?;
        tables.check_permission_refs(permissions)?;

        tables.last_role_id += 1;
        let role = Role::new(RoleId(tables.last_role_id), name);
        let id = role.id;
        tables.roles.insert(id, role);
        SyncPlan::diff(&BTreeSet::new(), permissions).apply_to(id, &mut tables.role_permissions);

        tables.role_view_by_id(id)
    }

    async fn update_role(
        &self,
        id: RoleId,
        name: &str,
        permissions: &BTreeSet<PermissionId>,
    ) -> StoreResult<Updated<RoleWithPermissions, PermissionId>> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let active = tables
            .roles
            .get(&id)
            .ok_or_else(|| not_found(Resource::Role, id.get()))?
            .is_active();
        ensure_active(active, Resource::Role, id.get())?;
        tables.check_role_name(name, Some(id))?;
        tables.check_permission_refs(permissions)?;

        let plan = SyncPlan::diff(&tables.permission_ids_of(id), permissions);
        plan.apply_to(id, &mut tables.role_permissions);
        if let Some(role) = tables.roles.get_mut(&id) {
            role.rename(name);
        }

        Ok(Updated {
            record: tables.role_view_by_id(id)?,
            sync: plan,
        })
    }

    async fn deactivate_role(&self, id: RoleId) -> StoreResult<Deactivated<RoleWithPermissions>> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let changed = tables
            .roles
            .get_mut(&id)
            .ok_or_else(|| not_found(Resource::Role, id.get()))?
            .deactivate();

        let plan = SyncPlan::detach_all(&tables.permission_ids_of(id));
        plan.apply_to(id, &mut tables.role_permissions);

        Ok(Deactivated {
            record: tables.role_view_by_id(id)?,
            changed,
            detached: plan.detach.len(),
        })
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> StoreResult<Page<UserWithRoles>> {
        let tables = self.tables.read().await;
        let matching: Vec<&User> = tables
            .users
            .values()
            .filter(|u| filter.lifecycle().matches(u.lifecycle))
            .filter(|u| {
                filter
                    .role_id
                    .map_or(true, |role| tables.user_roles.contains(&(u.id, role)))
            })
            .collect();
        Ok(Page::slice(matching, page).map(|user| tables.user_view(user)))
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserWithRoles>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|user| tables.user_view(user)))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserWithRoles>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email)
            .map(|user| tables.user_view(user)))
    }

    async fn insert_user(
        &self,
        record: NewUserRecord,
        roles: &BTreeSet<RoleId>,
    ) -> StoreResult<UserWithRoles> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        tables.check_email(&record.email, None)?;
        tables.check_role_refs(roles)?;

        tables.last_user_id += 1;
        let user = User::new(UserId(tables.last_user_id), record);
        let id = user.id;
        tables.users.insert(id, user);
        SyncPlan::diff(&BTreeSet::new(), roles).apply_to(id, &mut tables.user_roles);

        tables.user_view_by_id(id)
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
        roles: &BTreeSet<RoleId>,
    ) -> StoreResult<Updated<UserWithRoles, RoleId>> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let active = tables
            .users
            .get(&id)
            .ok_or_else(|| not_found(Resource::User, id.get()))?
            .is_active();
        ensure_active(active, Resource::User, id.get())?;
        tables.check_email(&changes.email, Some(id))?;
        tables.check_role_refs(roles)?;

        let plan = SyncPlan::diff(&tables.role_ids_of(id), roles);
        plan.apply_to(id, &mut tables.user_roles);
        if let Some(user) = tables.users.get_mut(&id) {
            user.apply(changes);
        }

        Ok(Updated {
            record: tables.user_view_by_id(id)?,
            sync: plan,
        })
    }

    async fn deactivate_user(&self, id: UserId) -> StoreResult<Deactivated<UserWithRoles>> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let changed = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| not_found(Resource::User, id.get()))?
            .deactivate();

        let plan = SyncPlan::detach_all(&tables.role_ids_of(id));
        plan.apply_to(id, &mut tables.user_roles);

        Ok(Deactivated {
            record: tables.user_view_by_id(id)?,
            changed,
            detached: plan.detach.len(),
        })
    }

    async fn user_grants(&self, id: UserId) -> StoreResult<Option<UserGrants>> {
        let tables = self.tables.read().await;
        let Some(user) = tables.users.get(&id) else {
            return Ok(None);
        };
        let roles = tables
            .role_ids_of(id)
            .into_iter()
            .filter_map(|role_id| tables.roles.get(&role_id))
            .map(|role| tables.role_view(role))
            .collect();
        Ok(Some(UserGrants {
            user: user.clone(),
            roles,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ids<I: IntoIterator<Item = u64>>(raw: I) -> BTreeSet<PermissionId> {
        raw.into_iter().map(PermissionId).collect()
    }

    fn record(email: &str) -> NewUserRecord {
        NewUserRecord {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    async fn seeded_permissions(store: &MemoryStore, names: &[&str]) -> Vec<PermissionId> {
        let mut out = Vec::new();
        for name in names {
            out.push(store.insert_permission(name).await.unwrap().id);
        }
        out
    }

    #[tokio::test]
    async fn test_ids_are_sequential_from_one() {
        let store = MemoryStore::new();
        let ids = seeded_permissions(&store, &["A", "B", "C"]).await;
        assert_eq!(ids, vec![PermissionId(1), PermissionId(2), PermissionId(3)]);
    }

    #[tokio::test]
    async fn test_permission_name_unique_even_when_inactive() {
        let store = MemoryStore::new();
        let perm = store.insert_permission("Leer").await.unwrap();
        store.deactivate_permission(perm.id).await.unwrap();

        let err = store.insert_permission("Leer").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                field: "name",
                value: "Leer".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let store = MemoryStore::new();
        let perm = store.insert_permission("Leer").await.unwrap();
        store.insert_permission("Crear").await.unwrap();

        assert!(store.rename_permission(perm.id, "Leer").await.is_ok());
        assert!(matches!(
            store.rename_permission(perm.id, "Crear").await,
            Err(StoreError::Duplicate { .. })
        ));
        assert!(matches!(
            store.rename_permission(PermissionId(99), "X").await,
            Err(StoreError::NotFound { resource: Resource::Permission, id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_active_listing_is_paged_by_id() {
        let store = MemoryStore::new();
        let ids = seeded_permissions(&store, &["P1", "P2", "P3", "P4", "P5", "P6", "P7"]).await;
        store.deactivate_permission(ids[1]).await.unwrap();

        let first = store
            .list_permissions(LifecycleFilter::ActiveOnly, PageRequest::new(1, 5))
            .await
            .unwrap();
        let names: Vec<_> = first.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["P1", "P3", "P4", "P5", "P6"]);
        assert_eq!(first.total, 6);

        let second = store
            .list_permissions(LifecycleFilter::ActiveOnly, PageRequest::new(2, 5))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].name, "P7");
    }

    #[tokio::test]
    async fn test_insert_role_rejects_unknown_permissions_atomically() {
        let store = MemoryStore::new();
        seeded_permissions(&store, &["A"]).await;

        let err = store.insert_role("Editor", &ids([1, 7, 9])).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::MissingReferences {
                field: "permission_ids",
                ids: vec![7, 9]
            }
        );
        assert!(store.find_role_by_name("Editor").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_role_untouched() {
        let store = MemoryStore::new();
        seeded_permissions(&store, &["A", "B"]).await;
        let role = store.insert_role("Editor", &ids([1, 2])).await.unwrap();

        let result = store.update_role(role.role.id, "Renamed", &ids([2, 42])).await;
        assert!(matches!(result, Err(StoreError::MissingReferences { .. })));

        let after = store.get_role(role.role.id).await.unwrap().unwrap();
        assert_eq!(after.role.name, "Editor");
        assert_eq!(after.permission_ids(), ids([1, 2]));
    }

    #[tokio::test]
    async fn test_update_role_reports_sync() {
        let store = MemoryStore::new();
        seeded_permissions(&store, &["A", "B", "C"]).await;
        let role = store.insert_role("Editor", &ids([1, 2])).await.unwrap();

        let updated = store.update_role(role.role.id, "Editor", &ids([2, 3])).await.unwrap();
        assert_eq!(updated.record.permission_ids(), ids([2, 3]));
        assert_eq!(updated.sync.attach, ids([3]));
        assert_eq!(updated.sync.detach, ids([1]));
    }

    #[tokio::test]
    async fn test_deactivate_role_detaches_but_keeps_permissions() {
        let store = MemoryStore::new();
        seeded_permissions(&store, &["A", "B"]).await;
        let role = store.insert_role("Editor", &ids([1, 2])).await.unwrap();

        let first = store.deactivate_role(role.role.id).await.unwrap();
        assert!(first.changed);
        assert_eq!(first.detached, 2);
        assert!(first.record.permissions.is_empty());

        let second = store.deactivate_role(role.role.id).await.unwrap();
        assert!(!second.changed);
        assert_eq!(second.detached, 0);

        assert!(store.get_permission(PermissionId(1)).await.unwrap().unwrap().is_active());
    }

    #[tokio::test]
    async fn test_inactive_role_cannot_be_updated() {
        let store = MemoryStore::new();
        seeded_permissions(&store, &["A", "B"]).await;
        let role = store.insert_role("Editor", &ids([1, 2])).await.unwrap().role.id;
        store.deactivate_role(role).await.unwrap();

        let err = store.update_role(role, "Editor", &ids([1, 2])).await.unwrap_err();
        assert_eq!(err, StoreError::Inactive { resource: Resource::Role, id: role.get() });

        let after = store.get_role(role).await.unwrap().unwrap();
        assert!(!after.role.is_active());
        assert!(after.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_be_updated() {
        let store = MemoryStore::new();
        let admin = store.insert_role("Admin", &BTreeSet::new()).await.unwrap().role.id;
        let user = store.insert_user(record("a@example.com"), &BTreeSet::from([admin])).await.unwrap();
        store.deactivate_user(user.user.id).await.unwrap();

        let changes = UserChanges {
            name: "Back".to_string(),
            email: "a@example.com".to_string(),
            password_hash: None,
        };
        let err = store
            .update_user(user.user.id, changes, &BTreeSet::from([admin]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Inactive { resource: Resource::User, .. }));

        let after = store.get_user(user.user.id).await.unwrap().unwrap();
        assert_eq!(after.user.name, "Test");
        assert!(after.roles.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_permission_cannot_be_renamed() {
        let store = MemoryStore::new();
        let perm = store.insert_permission("Leer").await.unwrap();
        store.deactivate_permission(perm.id).await.unwrap();

        assert!(matches!(
            store.rename_permission(perm.id, "Lectura").await,
            Err(StoreError::Inactive { resource: Resource::Permission, .. })
        ));
    }

    #[tokio::test]
    async fn test_user_filters() {
        let store = MemoryStore::new();
        let admin = store.insert_role("Admin", &BTreeSet::new()).await.unwrap().role.id;
        let a = store.insert_user(record("a@example.com"), &BTreeSet::from([admin])).await.unwrap();
        store.insert_user(record("b@example.com"), &BTreeSet::new()).await.unwrap();
        let c = store.insert_user(record("c@example.com"), &BTreeSet::new()).await.unwrap();
        store.deactivate_user(c.user.id).await.unwrap();

        let active = store.list_users(&UserFilter::default(), PageRequest::new(1, 5)).await.unwrap();
        assert_eq!(active.total, 2);

        let everyone = store.list_users(&UserFilter::all(), PageRequest::new(1, 5)).await.unwrap();
        assert_eq!(everyone.total, 3);

        let admins = store
            .list_users(&UserFilter::default().with_role(admin), PageRequest::new(1, 5))
            .await
            .unwrap();
        assert_eq!(admins.items.len(), 1);
        assert_eq!(admins.items[0].user.id, a.user.id);
    }

    #[tokio::test]
    async fn test_email_unique_on_update() {
        let store = MemoryStore::new();
        store.insert_user(record("a@example.com"), &BTreeSet::new()).await.unwrap();
        let b = store.insert_user(record("b@example.com"), &BTreeSet::new()).await.unwrap();

        let changes = UserChanges {
            name: "B".to_string(),
            email: "a@example.com".to_string(),
            password_hash: None,
        };
        let err = store.update_user(b.user.id, changes, &BTreeSet::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email", .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_sync() {
        let store = Arc::new(MemoryStore::new());
        seeded_permissions(&store, &["A", "B", "C", "D"]).await;
        let role = store.insert_role("Flip", &ids([1, 2])).await.unwrap().role.id;

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    let next = if i % 2 == 0 { ids([3, 4]) } else { ids([1, 2]) };
                    store.update_role(role, "Flip", &next).await.unwrap();
                }
            })
        };

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let seen = store.get_role(role).await.unwrap().unwrap().permission_ids();
                    assert!(seen == ids([1, 2]) || seen == ids([3, 4]), "partial set {:?}", seen);
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }
}
