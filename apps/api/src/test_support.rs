use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use permbit_application::{
    CreateRoleInput, EffectivePermissionService, GrantedPermission, NewPermission,
    PermissionCacheInvalidator, PermissionCacheService, PermissionDiscoveryService,
    PermissionGuard, PermissionRegistryRepository, PermissionSyncPlan, PermissionSyncReport,
    PersonRoleAssignment, PersonRoleGrants, RoleAdminService, RolePermissionToggle,
    RoleRepository, RouteCatalog, UpdateRoleInput,
};
use permbit_core::{AppError, AppResult, PersonId};
use permbit_domain::{PermissionBitfield, PermissionCode, PermissionDefinition, RoleDefinition};
use permbit_infrastructure::InMemoryPermissionCacheStore;
use sqlx::postgres::PgPoolOptions;

use crate::route_permissions::route_permission_catalog;
use crate::state::AppState;

pub const BOOTSTRAP_TOKEN: &str = "test-bootstrap-token";

fn read_only() -> AppError {
    AppError::Internal("read-only test repository".to_owned())
}

/// Registry and role ports backed by fixed data.
#[derive(Default)]
pub struct FixedPorts {
    permissions: Vec<PermissionDefinition>,
    grants: HashMap<PersonId, Vec<PersonRoleGrants>>,
}

impl FixedPorts {
    /// Registers an active permission owning `bit`.
    pub fn with_permission(mut self, value: &str, bit: u64) -> Self {
        let code = PermissionCode::new(value)
            .unwrap_or_else(|error| panic!("invalid test code: {error}"));
        self.permissions.push(PermissionDefinition {
            permission_id: format!("permission-{bit}"),
            category: code.category().to_owned(),
            name: code.display_name(),
            description: None,
            sort_order: 0,
            bitfield: PermissionBitfield::from(bit),
            is_deprecated: false,
            code,
        });
        self
    }

    /// Grants the listed registered codes to `person_id` through one custom role.
    pub fn with_grants(mut self, person_id: PersonId, codes: &[&str]) -> Self {
        let grants = self
            .permissions
            .iter()
            .filter(|permission| codes.contains(&permission.code.as_str()))
            .map(|permission| GrantedPermission {
                code: permission.code.clone(),
                bitfield: permission.bitfield.clone(),
                is_deprecated: permission.is_deprecated,
            })
            .collect();
        self.grants.entry(person_id).or_default().push(PersonRoleGrants {
            role_id: "role-reader".to_owned(),
            role_name: "READER".to_owned(),
            grants,
        });
        self
    }
}

#[async_trait]
impl PermissionRegistryRepository for FixedPorts {
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDefinition>> {
        Ok(self.permissions.clone())
    }

    async fn find_permission_by_code(&self, code: &str) -> AppResult<Option<PermissionDefinition>> {
        Ok(self
            .permissions
            .iter()
            .find(|permission| permission.code.as_str() == code)
            .cloned())
    }

    async fn highest_bitfield(&self) -> AppResult<Option<PermissionBitfield>> {
        Ok(self
            .permissions
            .iter()
            .map(|permission| permission.bitfield.clone())
            .max())
    }

    async fn create_permission(&self, _input: NewPermission) -> AppResult<PermissionDefinition> {
        Err(read_only())
    }

    async fn apply_sync(&self, _plan: PermissionSyncPlan) -> AppResult<PermissionSyncReport> {
        Err(read_only())
    }
}

#[async_trait]
impl RoleRepository for FixedPorts {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        Ok(Vec::new())
    }

    async fn find_role(&self, _role_id: &str) -> AppResult<Option<RoleDefinition>> {
        Ok(None)
    }

    async fn create_role(&self, _input: CreateRoleInput) -> AppResult<RoleDefinition> {
        Err(read_only())
    }

    async fn update_role(
        &self,
        _role_id: &str,
        _input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        Err(read_only())
    }

    async fn delete_role(&self, _role_id: &str) -> AppResult<()> {
        Err(read_only())
    }

    async fn toggle_role_permission(
        &self,
        _role_id: &str,
        _code: &PermissionCode,
    ) -> AppResult<RolePermissionToggle> {
        Err(read_only())
    }

    async fn reorder_role(&self, _role_id: &str, _position: i32) -> AppResult<Vec<RoleDefinition>> {
        Err(read_only())
    }

    async fn assign_role_to_person(&self, _person_id: PersonId, _role_id: &str) -> AppResult<()> {
        Err(read_only())
    }

    async fn remove_role_from_person(&self, _person_id: PersonId, _role_id: &str) -> AppResult<()> {
        Err(read_only())
    }

    async fn list_person_roles(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleAssignment>> {
        Ok(self
            .grants
            .get(&person_id)
            .into_iter()
            .flatten()
            .map(|role| PersonRoleAssignment {
                person_id,
                role_id: role.role_id.clone(),
                role_name: role.role_name.clone(),
                assigned_at: "2026-01-01T00:00:00Z".to_owned(),
            })
            .collect())
    }

    async fn load_person_grants(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleGrants>> {
        Ok(self.grants.get(&person_id).cloned().unwrap_or_default())
    }

    async fn list_role_holders(&self, _role_id: &str) -> AppResult<Vec<PersonId>> {
        Ok(Vec::new())
    }

    async fn count_role_assignments(&self) -> AppResult<u64> {
        Ok(0)
    }
}

/// Wires the real services over `ports`, an in-memory cache and the declared
/// route table. The Postgres pool is lazy and never connected.
pub fn test_state(ports: FixedPorts) -> AppState {
    let ports = Arc::new(ports);
    let registry: Arc<dyn PermissionRegistryRepository> = ports.clone();
    let roles: Arc<dyn RoleRepository> = ports;

    let permission_cache_service = PermissionCacheService::new(
        Arc::new(InMemoryPermissionCacheStore::new()),
        registry.clone(),
        roles.clone(),
        60,
    );
    let invalidator: Arc<dyn PermissionCacheInvalidator> =
        Arc::new(permission_cache_service.clone());
    let route_catalog = Arc::new(route_permission_catalog());
    let discovery_catalog: Arc<dyn RouteCatalog> = route_catalog.clone();
    let postgres_pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/permbit")
        .unwrap_or_else(|error| panic!("invalid test database url: {error}"));

    AppState {
        role_admin_service: RoleAdminService::new(
            registry.clone(),
            roles.clone(),
            invalidator.clone(),
        ),
        effective_permission_service: EffectivePermissionService::new(
            roles,
            permission_cache_service.clone(),
        ),
        permission_discovery_service: PermissionDiscoveryService::new(
            discovery_catalog,
            registry,
            invalidator,
        ),
        permission_guard: PermissionGuard::new(permission_cache_service.clone(), false),
        permission_cache_service,
        route_catalog,
        frontend_url: "http://localhost:3000".to_owned(),
        bootstrap_token: BOOTSTRAP_TOKEN.to_owned(),
        postgres_pool,
        redis_client: None,
        redis_required: false,
    }
}
