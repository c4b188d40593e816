use std::collections::BTreeMap;

use permbit_domain::PermissionBitfield;

use super::*;
use crate::permission_ports::NewPermission;

/// Input payload for registering a permission by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Code in `category.action` form.
    pub code: String,
    /// Optional display name, derived from the code when absent.
    pub name: Option<String>,
    /// Optional description.
    pub description: Option<String>,
}

/// Active codes grouped under one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCategory {
    /// Category name.
    pub category: String,
    /// Active codes in display order.
    pub codes: Vec<PermissionCode>,
}

/// Counters shown on the administration dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionDashboardStats {
    /// Active permissions.
    pub active_permissions: usize,
    /// Deprecated permissions kept for audit.
    pub deprecated_permissions: usize,
    /// Distinct categories among active permissions.
    pub categories: usize,
    /// Roles.
    pub roles: usize,
    /// System roles.
    pub system_roles: usize,
    /// Person/role assignments.
    pub role_assignments: u64,
}

impl RoleAdminService {
    /// Lists registry permissions.
    pub async fn list_permissions(
        &self,
        include_deprecated: bool,
    ) -> AppResult<Vec<PermissionDefinition>> {
        Ok(self
            .registry
            .list_permissions()
            .await?
            .into_iter()
            .filter(|permission| include_deprecated || permission.is_active())
            .collect())
    }

    /// Lists active permission codes grouped by category.
    pub async fn list_categories(&self) -> AppResult<Vec<PermissionCategory>> {
        let mut grouped: BTreeMap<String, Vec<PermissionCode>> = BTreeMap::new();
        for permission in self.list_permissions(false).await? {
            grouped
                .entry(permission.category)
                .or_default()
                .push(permission.code);
        }

        Ok(grouped
            .into_iter()
            .map(|(category, codes)| PermissionCategory { category, codes })
            .collect())
    }

    /// Registers a permission with the next free bit and refreshes the code
    /// cache.
    ///
    /// The permission is not granted to the super-admin role, and since no
    /// route declares it the next discovery sync flags it as deprecated. Codes
    /// meant to stay active belong in the route table.
    pub async fn create_permission(
        &self,
        input: CreatePermissionInput,
    ) -> AppResult<PermissionDefinition> {
        let code = PermissionCode::new(input.code.trim())?;
        if self
            .registry
            .find_permission_by_code(code.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "permission '{code}' already exists"
            )));
        }

        let bitfield =
            PermissionBitfield::next_after(self.registry.highest_bitfield().await?.as_ref());
        let sort_order = i32::try_from(
            self.registry
                .list_permissions()
                .await?
                .iter()
                .filter(|permission| permission.category == code.category())
                .count()
                + 1,
        )
        .unwrap_or(i32::MAX);

        let name = input
            .name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| code.display_name());

        let permission = self
            .registry
            .create_permission(NewPermission {
                category: code.category().to_owned(),
                name,
                description: input.description.or_else(|| Some(code.default_description())),
                sort_order,
                bitfield,
                code,
            })
            .await?;

        self.invalidator.invalidate_permission_cache().await?;

        info!(
            code = %permission.code,
            bitfield = %permission.bitfield,
            "permission created"
        );

        Ok(permission)
    }

    /// Returns counters for the administration dashboard.
    pub async fn dashboard_stats(&self) -> AppResult<PermissionDashboardStats> {
        let permissions = self.registry.list_permissions().await?;
        let roles = self.roles.list_roles().await?;

        let mut categories: Vec<&str> = permissions
            .iter()
            .filter(|permission| permission.is_active())
            .map(|permission| permission.category.as_str())
            .collect();
        categories.sort_unstable();
        categories.dedup();

        Ok(PermissionDashboardStats {
            active_permissions: permissions
                .iter()
                .filter(|permission| permission.is_active())
                .count(),
            deprecated_permissions: permissions
                .iter()
                .filter(|permission| permission.is_deprecated)
                .count(),
            categories: categories.len(),
            roles: roles.len(),
            system_roles: roles.iter().filter(|role| role.is_system).count(),
            role_assignments: self.roles.count_role_assignments().await?,
        })
    }
}
