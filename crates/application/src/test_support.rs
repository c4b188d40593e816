use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use permbit_core::{AppError, AppResult, PersonId};
use permbit_domain::{
    PermissionBitfield, PermissionCode, PermissionDefinition, RoleDefinition,
    SUPER_ADMIN_ROLE_NAME,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::PermissionCacheService;
use crate::permission_ports::{
    CreateRoleInput, GrantedPermission, NewPermission, PermissionCacheStore,
    PermissionRegistryRepository, PermissionSyncPlan, PermissionSyncReport, PersonRoleAssignment,
    PersonRoleGrants, RolePermissionToggle, RoleRepository, UpdateRoleInput,
};

pub(crate) fn code(value: &str) -> PermissionCode {
    PermissionCode::new(value).unwrap_or_else(|error| panic!("invalid test code: {error}"))
}

/// In-memory cache backend with expiry on tokio's clock.
#[derive(Default)]
pub(crate) struct FakeCacheStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
    failing: AtomicBool,
}

impl FakeCacheStore {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn operations(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
            + self.sets.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    pub(crate) async fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .await
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone())
    }

    fn check_available(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache backend unavailable".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionCacheStore for FakeCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.raw(key).await)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u32) -> AppResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let expires_at = Instant::now() + Duration::from_secs(u64::from(ttl_seconds));
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), (value.to_owned(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[derive(Default)]
struct FakeState {
    permissions: Vec<PermissionDefinition>,
    roles: Vec<RoleDefinition>,
    assignments: Vec<(PersonId, String)>,
    next_id: u32,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn role_mut(&mut self, role_id: &str) -> AppResult<&mut RoleDefinition> {
        self.roles
            .iter_mut()
            .find(|role| role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    fn insert_permission(&mut self, input: NewPermission) -> PermissionDefinition {
        let permission = PermissionDefinition {
            permission_id: self.next_id("permission"),
            code: input.code,
            category: input.category,
            name: input.name,
            description: input.description,
            sort_order: input.sort_order,
            bitfield: input.bitfield,
            is_deprecated: false,
        };
        self.permissions.push(permission.clone());
        permission
    }
}

/// In-memory registry and role store sharing one state, like one database.
#[derive(Default)]
pub(crate) struct FakePermissionStore {
    state: Mutex<FakeState>,
    registry_lookups: AtomicUsize,
    grant_loads: AtomicUsize,
    mutations: AtomicUsize,
    fail_sync: AtomicBool,
}

impl FakePermissionStore {
    pub(crate) fn registry_lookups(&self) -> usize {
        self.registry_lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn grant_loads(&self) -> usize {
        self.grant_loads.load(Ordering::SeqCst)
    }

    pub(crate) fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub(crate) fn set_fail_sync(&self, failing: bool) {
        self.fail_sync.store(failing, Ordering::SeqCst);
    }

    pub(crate) async fn seed_permission(&self, value: &str, bitfield: PermissionBitfield) {
        let permission_code = code(value);
        let mut state = self.state.lock().await;
        let sort_order = i32::try_from(state.permissions.len() + 1).unwrap_or(i32::MAX);
        state.insert_permission(NewPermission {
            category: permission_code.category().to_owned(),
            name: permission_code.display_name(),
            description: None,
            sort_order,
            bitfield,
            code: permission_code,
        });
    }

    pub(crate) async fn deprecate(&self, value: &str) {
        let mut state = self.state.lock().await;
        if let Some(permission) = state
            .permissions
            .iter_mut()
            .find(|permission| permission.code.as_str() == value)
        {
            permission.is_deprecated = true;
        }
    }

    pub(crate) async fn seed_role(&self, name: &str, is_system: bool, codes: &[&str]) -> String {
        let mut state = self.state.lock().await;
        let role_id = state.next_id("role");
        let sort_order = i32::try_from(state.roles.len() + 1).unwrap_or(i32::MAX);
        state.roles.push(RoleDefinition {
            role_id: role_id.clone(),
            name: name.to_owned(),
            description: None,
            is_system,
            sort_order,
            permissions: codes.iter().map(|value| code(value)).collect(),
        });
        role_id
    }

    pub(crate) async fn seed_assignment(&self, person_id: PersonId, role_id: &str) {
        self.state
            .lock()
            .await
            .assignments
            .push((person_id, role_id.to_owned()));
    }

    /// Grants a code to a role directly, bypassing every service.
    pub(crate) async fn grant_directly(&self, role_id: &str, value: &str) {
        let mut state = self.state.lock().await;
        if let Ok(role) = state.role_mut(role_id) {
            role.permissions.push(code(value));
        }
    }

    pub(crate) async fn permissions(&self) -> Vec<PermissionDefinition> {
        self.state.lock().await.permissions.clone()
    }

    pub(crate) async fn permission(&self, value: &str) -> Option<PermissionDefinition> {
        self.state
            .lock()
            .await
            .permissions
            .iter()
            .find(|permission| permission.code.as_str() == value)
            .cloned()
    }

    pub(crate) async fn role(&self, role_id: &str) -> Option<RoleDefinition> {
        self.state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.role_id == role_id)
            .cloned()
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PermissionRegistryRepository for FakePermissionStore {
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDefinition>> {
        let mut permissions = self.state.lock().await.permissions.clone();
        permissions.sort_by(|left, right| {
            left.category
                .cmp(&right.category)
                .then(left.sort_order.cmp(&right.sort_order))
        });
        Ok(permissions)
    }

    async fn find_permission_by_code(&self, value: &str) -> AppResult<Option<PermissionDefinition>> {
        self.registry_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.permission(value).await)
    }

    async fn highest_bitfield(&self) -> AppResult<Option<PermissionBitfield>> {
        Ok(self
            .state
            .lock()
            .await
            .permissions
            .iter()
            .map(|permission| permission.bitfield.clone())
            .max())
    }

    async fn create_permission(&self, input: NewPermission) -> AppResult<PermissionDefinition> {
        let mut state = self.state.lock().await;
        if state
            .permissions
            .iter()
            .any(|permission| permission.code == input.code)
        {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                input.code
            )));
        }
        self.record_mutation();
        Ok(state.insert_permission(input))
    }

    async fn apply_sync(&self, plan: PermissionSyncPlan) -> AppResult<PermissionSyncReport> {
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(AppError::Internal("database unavailable".to_owned()));
        }

        let mut state = self.state.lock().await;
        let mut report = PermissionSyncReport::default();

        for input in plan.to_insert {
            if state
                .permissions
                .iter()
                .any(|permission| permission.code == input.code)
            {
                continue;
            }
            report.inserted.push(input.code.clone());
            state.insert_permission(input);
        }

        let inserted = report.inserted.clone();
        if let Some(super_admin) = state
            .roles
            .iter_mut()
            .find(|role| role.name == SUPER_ADMIN_ROLE_NAME)
        {
            for inserted_code in inserted {
                if !super_admin.permissions.contains(&inserted_code) {
                    super_admin.permissions.push(inserted_code);
                    report.super_admin_grants += 1;
                }
            }
            if report.super_admin_grants > 0 {
                report.affected_role_ids.push(super_admin.role_id.clone());
            }
        }

        for permission in &mut state.permissions {
            let declared = plan.declared_codes.contains(&permission.code);
            if !declared && !permission.is_deprecated {
                permission.is_deprecated = true;
                report.deprecated.push(permission.code.clone());
            } else if declared && permission.is_deprecated {
                permission.is_deprecated = false;
                report.restored.push(permission.code.clone());
            }
        }

        for role in &state.roles {
            let affected = role.permissions.iter().any(|granted| {
                report.deprecated.contains(granted) || report.restored.contains(granted)
            });
            if affected && !report.affected_role_ids.contains(&role.role_id) {
                report.affected_role_ids.push(role.role_id.clone());
            }
        }
        report.affected_role_ids.sort();

        if !report.is_noop() {
            self.record_mutation();
        }
        Ok(report)
    }
}

#[async_trait]
impl RoleRepository for FakePermissionStore {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let mut roles = self.state.lock().await.roles.clone();
        roles.sort_by_key(|role| role.sort_order);
        Ok(roles)
    }

    async fn find_role(&self, role_id: &str) -> AppResult<Option<RoleDefinition>> {
        Ok(self.role(role_id).await)
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut state = self.state.lock().await;
        if state.roles.iter().any(|role| role.name == input.name) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name
            )));
        }

        let role = RoleDefinition {
            role_id: state.next_id("role"),
            name: input.name,
            description: input.description,
            is_system: false,
            sort_order: i32::try_from(state.roles.len() + 1).unwrap_or(i32::MAX),
            permissions: input.permissions,
        };
        state.roles.push(role.clone());
        self.record_mutation();
        Ok(role)
    }

    async fn update_role(&self, role_id: &str, input: UpdateRoleInput) -> AppResult<RoleDefinition> {
        let mut state = self.state.lock().await;
        let role = state.role_mut(role_id)?;
        if let Some(name) = input.name {
            role.name = name;
        }
        if let Some(description) = input.description {
            role.description = Some(description);
        }
        let role = role.clone();
        self.record_mutation();
        Ok(role)
    }

    async fn delete_role(&self, role_id: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.roles.retain(|role| role.role_id != role_id);
        state
            .assignments
            .retain(|(_, assigned_role_id)| assigned_role_id != role_id);
        self.record_mutation();
        Ok(())
    }

    async fn toggle_role_permission(
        &self,
        role_id: &str,
        permission_code: &PermissionCode,
    ) -> AppResult<RolePermissionToggle> {
        let mut state = self.state.lock().await;
        let role = state.role_mut(role_id)?;
        self.record_mutation();
        if role.permissions.contains(permission_code) {
            role.permissions.retain(|granted| granted != permission_code);
            Ok(RolePermissionToggle::Revoked)
        } else {
            role.permissions.push(permission_code.clone());
            Ok(RolePermissionToggle::Granted)
        }
    }

    async fn reorder_role(&self, role_id: &str, position: i32) -> AppResult<Vec<RoleDefinition>> {
        let mut state = self.state.lock().await;
        let mut roles = state.roles.clone();
        roles.sort_by_key(|role| role.sort_order);

        let index = roles
            .iter()
            .position(|role| role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        let moved = roles.remove(index);
        let target = usize::try_from(position - 1)
            .unwrap_or(0)
            .min(roles.len());
        roles.insert(target, moved);

        for (offset, role) in roles.iter_mut().enumerate() {
            role.sort_order = i32::try_from(offset + 1).unwrap_or(i32::MAX);
        }

        state.roles = roles.clone();
        self.record_mutation();
        Ok(roles)
    }

    async fn assign_role_to_person(&self, person_id: PersonId, role_id: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let assignment = (person_id, role_id.to_owned());
        if !state.assignments.contains(&assignment) {
            state.assignments.push(assignment);
            self.record_mutation();
        }
        Ok(())
    }

    async fn remove_role_from_person(&self, person_id: PersonId, role_id: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let before = state.assignments.len();
        state
            .assignments
            .retain(|(assigned_person, assigned_role)| {
                !(assigned_person == &person_id && assigned_role == role_id)
            });
        if state.assignments.len() == before {
            return Err(AppError::NotFound(format!(
                "role assignment '{person_id}:{role_id}' was not found"
            )));
        }
        self.record_mutation();
        Ok(())
    }

    async fn list_person_roles(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleAssignment>> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|(assigned_person, _)| assigned_person == &person_id)
            .filter_map(|(_, role_id)| state.roles.iter().find(|role| &role.role_id == role_id))
            .map(|role| PersonRoleAssignment {
                person_id,
                role_id: role.role_id.clone(),
                role_name: role.name.clone(),
                assigned_at: "2026-01-01T00:00:00Z".to_owned(),
            })
            .collect())
    }

    async fn load_person_grants(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleGrants>> {
        self.grant_loads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;

        Ok(state
            .assignments
            .iter()
            .filter(|(assigned_person, _)| assigned_person == &person_id)
            .filter_map(|(_, role_id)| state.roles.iter().find(|role| &role.role_id == role_id))
            .map(|role| PersonRoleGrants {
                role_id: role.role_id.clone(),
                role_name: role.name.clone(),
                grants: role
                    .permissions
                    .iter()
                    .filter_map(|granted| {
                        state
                            .permissions
                            .iter()
                            .find(|permission| &permission.code == granted)
                    })
                    .map(|permission| GrantedPermission {
                        code: permission.code.clone(),
                        bitfield: permission.bitfield.clone(),
                        is_deprecated: permission.is_deprecated,
                    })
                    .collect(),
            })
            .collect())
    }

    async fn list_role_holders(&self, role_id: &str) -> AppResult<Vec<PersonId>> {
        Ok(self
            .state
            .lock()
            .await
            .assignments
            .iter()
            .filter(|(_, assigned_role)| assigned_role == role_id)
            .map(|(person_id, _)| *person_id)
            .collect())
    }

    async fn count_role_assignments(&self) -> AppResult<u64> {
        Ok(u64::try_from(self.state.lock().await.assignments.len()).unwrap_or(u64::MAX))
    }
}

/// Fakes wired together the way the API composition root wires adapters.
pub(crate) struct Harness {
    pub(crate) store: Arc<FakePermissionStore>,
    pub(crate) cache_store: Arc<FakeCacheStore>,
    pub(crate) cache: PermissionCacheService,
}

pub(crate) fn harness(ttl_seconds: u32) -> Harness {
    let store = Arc::new(FakePermissionStore::default());
    let cache_store = Arc::new(FakeCacheStore::default());
    let cache = PermissionCacheService::new(
        cache_store.clone(),
        store.clone(),
        store.clone(),
        ttl_seconds,
    );

    Harness {
        store,
        cache_store,
        cache,
    }
}
