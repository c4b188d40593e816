use async_trait::async_trait;
use permbit_core::{AppResult, PersonId};
use permbit_domain::{PermissionBitfield, PermissionCode, RoleDefinition};

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Grants to attach to the role.
    pub permissions: Vec<PermissionCode>,
}

/// Input payload for renaming or describing a role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateRoleInput {
    /// New unique name, when changing it.
    pub name: Option<String>,
    /// New description, when changing it.
    pub description: Option<String>,
}

/// Outcome of toggling one grant on a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePermissionToggle {
    /// The permission is now granted.
    Granted,
    /// The permission is no longer granted.
    Revoked,
}

/// Assignment projection mapping a person to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRoleAssignment {
    /// Person identifier.
    pub person_id: PersonId,
    /// Role identifier.
    pub role_id: String,
    /// Role name.
    pub role_name: String,
    /// Assignment timestamp in RFC3339.
    pub assigned_at: String,
}

/// One permission granted through a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedPermission {
    /// Permission code.
    pub code: PermissionCode,
    /// Bit owned by the permission.
    pub bitfield: PermissionBitfield,
    /// Deprecated grants are kept for audit but never counted.
    pub is_deprecated: bool,
}

/// A role held by a person together with its grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRoleGrants {
    /// Role identifier.
    pub role_id: String,
    /// Role name.
    pub role_name: String,
    /// Grants attached to the role.
    pub grants: Vec<GrantedPermission>,
}

/// Repository port for roles and their person/permission associations.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists every role with its grants, by sort order.
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>>;

    /// Finds one role.
    async fn find_role(&self, role_id: &str) -> AppResult<Option<RoleDefinition>>;

    /// Creates a role placed after every existing role. Fails with a conflict
    /// when the name exists.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition>;

    /// Updates name and description of a role.
    async fn update_role(&self, role_id: &str, input: UpdateRoleInput)
    -> AppResult<RoleDefinition>;

    /// Deletes a role with its grants and assignments.
    async fn delete_role(&self, role_id: &str) -> AppResult<()>;

    /// Adds the grant when absent, removes it otherwise.
    async fn toggle_role_permission(
        &self,
        role_id: &str,
        code: &PermissionCode,
    ) -> AppResult<RolePermissionToggle>;

    /// Moves a role to a new position and renumbers all roles contiguously.
    async fn reorder_role(&self, role_id: &str, position: i32) -> AppResult<Vec<RoleDefinition>>;

    /// Assigns a role to a person. Assigning twice is a no-op.
    async fn assign_role_to_person(&self, person_id: PersonId, role_id: &str) -> AppResult<()>;

    /// Removes a role from a person. Fails with not found when not assigned.
    async fn remove_role_from_person(&self, person_id: PersonId, role_id: &str) -> AppResult<()>;

    /// Lists the role assignments of one person.
    async fn list_person_roles(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleAssignment>>;

    /// Loads every role held by a person with the granted bitfields.
    async fn load_person_grants(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleGrants>>;

    /// Lists the persons holding a role.
    async fn list_role_holders(&self, role_id: &str) -> AppResult<Vec<PersonId>>;

    /// Counts person/role assignments.
    async fn count_role_assignments(&self) -> AppResult<u64>;
}
