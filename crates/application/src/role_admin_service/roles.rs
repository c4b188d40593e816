use permbit_core::NonEmptyString;

use super::*;

use crate::permission_ports::{CreateRoleInput, RolePermissionToggle, UpdateRoleInput};

impl RoleAdminService {
    /// Lists roles by sort order.
    pub async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        self.roles.list_roles().await
    }

    /// Returns one role.
    pub async fn get_role(&self, role_id: &str) -> AppResult<RoleDefinition> {
        self.require_role(role_id).await
    }

    /// Creates a custom role. Granted codes must exist and be active.
    pub async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let name = String::from(NonEmptyString::new(input.name.trim())?);

        for code in &input.permissions {
            let permission = self.require_permission(code).await?;
            if permission.is_deprecated {
                return Err(AppError::Validation(format!(
                    "deprecated permission '{code}' cannot be granted"
                )));
            }
        }

        let role = self
            .roles
            .create_role(CreateRoleInput {
                name,
                description: input.description,
                permissions: input.permissions,
            })
            .await?;

        info!(role_id = %role.role_id, role = %role.name, "role created");
        Ok(role)
    }

    /// Renames or describes a custom role.
    pub async fn update_role(
        &self,
        role_id: &str,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.require_mutable_role(role_id).await?;

        let name = input
            .name
            .map(|name| NonEmptyString::new(name.trim()).map(String::from))
            .transpose()?;

        let role = self
            .roles
            .update_role(
                role_id,
                UpdateRoleInput {
                    name,
                    description: input.description,
                },
            )
            .await?;

        self.invalidator.clear_role_permission_cache(role_id).await?;
        Ok(role)
    }

    /// Deletes a custom role and clears the caches of its former holders.
    pub async fn delete_role(&self, role_id: &str) -> AppResult<()> {
        let role = self.require_mutable_role(role_id).await?;
        let holders = self.roles.list_role_holders(role_id).await?;

        self.roles.delete_role(role_id).await?;

        for person_id in holders {
            self.invalidator
                .clear_person_permission_cache(person_id)
                .await?;
        }

        info!(role_id, role = %role.name, "role deleted");
        Ok(())
    }

    /// Grants the permission when absent, revokes it otherwise, and clears the
    /// caches of every holder.
    pub async fn toggle_role_permission(
        &self,
        role_id: &str,
        code: &PermissionCode,
    ) -> AppResult<RolePermissionToggle> {
        let role = self.require_mutable_role(role_id).await?;
        let permission = self.require_permission(code).await?;

        if permission.is_deprecated && !role.permissions.contains(code) {
            return Err(AppError::Validation(format!(
                "deprecated permission '{code}' cannot be granted"
            )));
        }

        let toggle = self.roles.toggle_role_permission(role_id, code).await?;
        self.invalidator.clear_role_permission_cache(role_id).await?;

        info!(role_id, code = %code, outcome = ?toggle, "role permission toggled");
        Ok(toggle)
    }

    /// Moves a role to `position` (1-based) and returns all roles renumbered.
    pub async fn reorder_role(&self, role_id: &str, position: i32) -> AppResult<Vec<RoleDefinition>> {
        if position < 1 {
            return Err(AppError::Validation(
                "role position must be at least 1".to_owned(),
            ));
        }

        self.require_role(role_id).await?;
        self.roles.reorder_role(role_id, position).await
    }
}
