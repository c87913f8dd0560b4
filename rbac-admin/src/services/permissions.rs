//! Permission administration

use rbac_core::{Action, LifecycleFilter, Resource};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{report, ActionOutcome, ServiceContext};
use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};
use crate::models::{Permission, PermissionId, UserId};
use crate::pagination::{Page, PageRequest};
use crate::store::RbacStore;
use crate::validation::{self, ValidationErrors};

/// Create, rename, list and deactivate permissions.
#[derive(Clone)]
pub struct PermissionService {
    ctx: ServiceContext,
}

impl std::fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionService")
            .field("config", &self.ctx.config)
            .finish_non_exhaustive()
    }
}

impl PermissionService {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn RbacStore>, config: Arc<AdminConfig>) -> Self {
        Self {
            ctx: ServiceContext::new(store, config),
        }
    }

    pub(crate) fn from_context(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// One page of active permissions, ordered by id.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn list_active(&self, actor: UserId, page: u32) -> AdminResult<Page<Permission>> {
        self.gate(actor, Action::Read).await?;
        let request = PageRequest::new(page, self.ctx.config.page_size);
        self.ctx
            .store
            .list_permissions(LifecycleFilter::ActiveOnly, request)
            .await
            .map_err(report)
    }

    /// Every active permission, for role form option lists.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn assignable(&self, actor: UserId) -> AdminResult<Vec<Permission>> {
        self.gate(actor, Action::Read).await?;
        self.ctx.store.active_permissions().await.map_err(report)
    }

    /// Look up a permission, active or not.
    #[instrument(skip(self), fields(actor = %actor, permission_id = %id))]
    pub async fn get(&self, actor: UserId, id: PermissionId) -> AdminResult<Permission> {
        self.gate(actor, Action::Read).await?;
        self.ctx
            .store
            .get_permission(id)
            .await
            .map_err(report)?
            .ok_or(AdminError::NotFound {
                resource: Resource::Permission,
                id: id.get(),
            })
    }

    /// Create an active permission.
    ///
    /// # Errors
    ///
    /// `Validation` if the name is blank or held by any permission, active
    /// or not.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn create(&self, actor: UserId, name: &str) -> AdminResult<ActionOutcome<Permission>> {
        self.gate(actor, Action::Create).await?;
        let name = validate_name(name)?;
        debug!("Creating permission {}", name);

        let permission = self.ctx.store.insert_permission(name).await.map_err(report)?;
        info!(permission_id = %permission.id, "Permission created");
        Ok(ActionOutcome::new(permission, "Permission created successfully"))
    }

    /// Rename a permission.
    #[instrument(skip(self), fields(actor = %actor, permission_id = %id))]
    pub async fn update(
        &self,
        actor: UserId,
        id: PermissionId,
        name: &str,
    ) -> AdminResult<ActionOutcome<Permission>> {
        self.gate(actor, Action::Update).await?;
        let name = validate_name(name)?;

        let permission = self
            .ctx
            .store
            .rename_permission(id, name)
            .await
            .map_err(report)?;
        info!("Permission renamed to {}", permission.name);
        Ok(ActionOutcome::new(permission, "Permission updated successfully"))
    }

    /// Mark a permission inactive. Repeating the call is a no-op.
    ///
    /// Roles keep their association rows to the permission.
    #[instrument(skip(self), fields(actor = %actor, permission_id = %id))]
    pub async fn deactivate(
        &self,
        actor: UserId,
        id: PermissionId,
    ) -> AdminResult<ActionOutcome<Permission>> {
        self.gate(actor, Action::Delete).await?;

        let result = self.ctx.store.deactivate_permission(id).await.map_err(report)?;
        if result.changed {
            info!("Permission deactivated");
        } else {
            debug!("Permission was already inactive");
        }
        Ok(ActionOutcome::new(result.record, "Permission deleted successfully"))
    }

    async fn gate(&self, actor: UserId, action: Action) -> AdminResult<()> {
        self.ctx
            .resolver
            .authorize(actor, action, Resource::Permission)
            .await
    }
}

fn validate_name(name: &str) -> AdminResult<&str> {
    let mut errors = ValidationErrors::new();
    match validation::required(&mut errors, "name", name) {
        Some(name) => Ok(name),
        None => Err(errors.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleId;
    use crate::store::MemoryStore;
    use std::collections::BTreeSet;

    async fn setup() -> (PermissionService, UserId, UserId) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = BTreeSet::new();
        for name in ["Leer", "Crear", "Editar", "Eliminar"] {
            ids.insert(store.insert_permission(name).await.unwrap().id);
        }
        let role = store.insert_role("Admin", &ids).await.unwrap().role.id;

        let admin = store
            .insert_user(record("admin@example.com"), &BTreeSet::from([role]))
            .await
            .unwrap()
            .user
            .id;
        let nobody = store
            .insert_user(record("nobody@example.com"), &BTreeSet::<RoleId>::new())
            .await
            .unwrap()
            .user
            .id;

        let service = PermissionService::new(store, Arc::new(AdminConfig::default()));
        (service, admin, nobody)
    }

    fn record(email: &str) -> crate::models::NewUserRecord {
        crate::models::NewUserRecord {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_confirms() {
        let (service, admin, _) = setup().await;
        let outcome = service.create(admin, "  Exportar ").await.unwrap();
        assert_eq!(outcome.data.name, "Exportar");
        assert!(outcome.data.is_active());
        assert_eq!(outcome.message, "Permission created successfully");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (service, admin, _) = setup().await;
        let err = service.create(admin, "   ").await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("name"),
            Some("The name field is required.")
        );
    }

    #[tokio::test]
    async fn test_name_stays_taken_after_deactivation() {
        let (service, admin, _) = setup().await;
        let first = service.create(admin, "Exportar").await.unwrap().data;
        service.deactivate(admin, first.id).await.unwrap();

        let err = service.create(admin, "Exportar").await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("name"),
            Some("The name has already been taken.")
        );
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (service, admin, _) = setup().await;
        let err = service.update(admin, PermissionId(77), "X").await.unwrap_err();
        assert!(matches!(err, AdminError::NotFound { resource: Resource::Permission, id: 77 }));
    }

    #[tokio::test]
    async fn test_deactivate_twice() {
        let (service, admin, _) = setup().await;
        let perm = service.create(admin, "Exportar").await.unwrap().data;

        let first = service.deactivate(admin, perm.id).await.unwrap();
        let second = service.deactivate(admin, perm.id).await.unwrap();
        assert!(!first.data.is_active());
        assert_eq!(first.data.lifecycle, second.data.lifecycle);

        let page = service.list_active(admin, 1).await.unwrap();
        assert!(page.items.iter().all(|p| p.id != perm.id));
    }

    #[tokio::test]
    async fn test_deactivate_missing_is_not_found() {
        let (service, admin, _) = setup().await;
        let err = service.deactivate(admin, PermissionId(404)).await.unwrap_err();
        assert!(matches!(err, AdminError::NotFound { resource: Resource::Permission, id: 404 }));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_deactivated_permission_cannot_be_renamed() {
        let (service, admin, _) = setup().await;
        let perm = service.create(admin, "Exportar").await.unwrap().data;
        service.deactivate(admin, perm.id).await.unwrap();

        let err = service.update(admin, perm.id, "Importar").await.unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert_eq!(service.get(admin, perm.id).await.unwrap().name, "Exportar");
    }

    #[tokio::test]
    async fn test_gate_blocks_without_side_effects() {
        let (service, admin, nobody) = setup().await;
        let err = service.create(nobody, "Exportar").await.unwrap_err();
        assert!(matches!(err, AdminError::Forbidden { action: Action::Create, .. }));

        let err = service.list_active(nobody, 1).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let all = service.assignable(admin).await.unwrap();
        assert!(all.iter().all(|p| p.name != "Exportar"));
    }
}
