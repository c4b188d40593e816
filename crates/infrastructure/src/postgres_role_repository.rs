use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use permbit_application::{
    CreateRoleInput, GrantedPermission, PersonRoleAssignment, PersonRoleGrants, RoleRepository,
    RolePermissionToggle, UpdateRoleInput,
};
use permbit_core::{AppError, AppResult, PersonId};
use permbit_domain::{PermissionCode, RoleDefinition};

use crate::postgres_permission_registry_repository::{parse_stored_bitfield, parse_stored_code};

mod assignments;
mod roles;

/// PostgreSQL-backed repository for roles, grants and person assignments.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    description: Option<String>,
    is_system: bool,
    sort_order: i32,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct PersonRoleRow {
    person_id: uuid::Uuid,
    role_id: uuid::Uuid,
    role_name: String,
    assigned_at: String,
}

#[derive(Debug, FromRow)]
struct PersonGrantRow {
    role_id: uuid::Uuid,
    role_name: String,
    code: Option<String>,
    bitfield: Option<String>,
    is_deprecated: Option<bool>,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        self.list_roles_impl(None).await
    }

    async fn find_role(&self, role_id: &str) -> AppResult<Option<RoleDefinition>> {
        let Some(role_uuid) = parse_role_id(role_id) else {
            return Ok(None);
        };

        Ok(self.list_roles_impl(Some(role_uuid)).await?.into_iter().next())
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        self.create_role_impl(input).await
    }

    async fn update_role(
        &self,
        role_id: &str,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.update_role_impl(require_role_id(role_id)?, input).await
    }

    async fn delete_role(&self, role_id: &str) -> AppResult<()> {
        self.delete_role_impl(require_role_id(role_id)?).await
    }

    async fn toggle_role_permission(
        &self,
        role_id: &str,
        code: &PermissionCode,
    ) -> AppResult<RolePermissionToggle> {
        self.toggle_role_permission_impl(require_role_id(role_id)?, code)
            .await
    }

    async fn reorder_role(&self, role_id: &str, position: i32) -> AppResult<Vec<RoleDefinition>> {
        self.reorder_role_impl(require_role_id(role_id)?, position)
            .await
    }

    async fn assign_role_to_person(&self, person_id: PersonId, role_id: &str) -> AppResult<()> {
        self.assign_role_to_person_impl(person_id, require_role_id(role_id)?)
            .await
    }

    async fn remove_role_from_person(&self, person_id: PersonId, role_id: &str) -> AppResult<()> {
        self.remove_role_from_person_impl(person_id, require_role_id(role_id)?)
            .await
    }

    async fn list_person_roles(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleAssignment>> {
        self.list_person_roles_impl(person_id).await
    }

    async fn load_person_grants(&self, person_id: PersonId) -> AppResult<Vec<PersonRoleGrants>> {
        self.load_person_grants_impl(person_id).await
    }

    async fn list_role_holders(&self, role_id: &str) -> AppResult<Vec<PersonId>> {
        let Some(role_uuid) = parse_role_id(role_id) else {
            return Ok(Vec::new());
        };

        self.list_role_holders_impl(role_uuid).await
    }

    async fn count_role_assignments(&self) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM person_roles")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count role assignments: {error}"))
            })?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn parse_role_id(role_id: &str) -> Option<uuid::Uuid> {
    uuid::Uuid::parse_str(role_id).ok()
}

fn require_role_id(role_id: &str) -> AppResult<uuid::Uuid> {
    parse_role_id(role_id)
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<RoleDefinition>> {
    let mut roles: Vec<RoleDefinition> = Vec::new();

    for row in rows {
        let role_id = row.role_id.to_string();
        let position = match roles.iter().position(|role| role.role_id == role_id) {
            Some(position) => position,
            None => {
                roles.push(RoleDefinition {
                    role_id,
                    name: row.role_name,
                    description: row.description,
                    is_system: row.is_system,
                    sort_order: row.sort_order,
                    permissions: Vec::new(),
                });
                roles.len() - 1
            }
        };

        if let Some(permission) = row.permission {
            roles[position]
                .permissions
                .push(parse_stored_code(permission.as_str())?);
        }
    }

    Ok(roles)
}

fn aggregate_grants(rows: Vec<PersonGrantRow>) -> AppResult<Vec<PersonRoleGrants>> {
    let mut roles: Vec<PersonRoleGrants> = Vec::new();

    for row in rows {
        let role_id = row.role_id.to_string();
        let position = match roles.iter().position(|role| role.role_id == role_id) {
            Some(position) => position,
            None => {
                roles.push(PersonRoleGrants {
                    role_id,
                    role_name: row.role_name,
                    grants: Vec::new(),
                });
                roles.len() - 1
            }
        };

        if let (Some(code), Some(bitfield)) = (row.code, row.bitfield) {
            roles[position].grants.push(GrantedPermission {
                bitfield: parse_stored_bitfield(code.as_str(), bitfield.as_str())?,
                code: parse_stored_code(code.as_str())?,
                is_deprecated: row.is_deprecated.unwrap_or(false),
            });
        }
    }

    Ok(roles)
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to save role: {error}"))
}
