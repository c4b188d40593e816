use std::sync::Arc;

use permbit_core::{AppError, AppResult, PersonId};
use permbit_domain::{PermissionCode, PermissionDefinition, RoleDefinition};
use tracing::info;

use crate::permission_ports::{
    PermissionCacheInvalidator, PermissionRegistryRepository, RoleRepository,
};

mod permissions;
mod persons;
mod roles;

pub use permissions::{CreatePermissionInput, PermissionCategory, PermissionDashboardStats};

/// Application service for role and permission administration.
///
/// Every write path invalidates the affected cache entries before returning.
#[derive(Clone)]
pub struct RoleAdminService {
    registry: Arc<dyn PermissionRegistryRepository>,
    roles: Arc<dyn RoleRepository>,
    invalidator: Arc<dyn PermissionCacheInvalidator>,
}

impl RoleAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        registry: Arc<dyn PermissionRegistryRepository>,
        roles: Arc<dyn RoleRepository>,
        invalidator: Arc<dyn PermissionCacheInvalidator>,
    ) -> Self {
        Self {
            registry,
            roles,
            invalidator,
        }
    }

    async fn require_role(&self, role_id: &str) -> AppResult<RoleDefinition> {
        self.roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    async fn require_mutable_role(&self, role_id: &str) -> AppResult<RoleDefinition> {
        let role = self.require_role(role_id).await?;
        if role.is_system {
            return Err(AppError::Forbidden(format!(
                "system role '{}' cannot be modified",
                role.name
            )));
        }

        Ok(role)
    }

    async fn require_permission(&self, code: &PermissionCode) -> AppResult<PermissionDefinition> {
        self.registry
            .find_permission_by_code(code.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission '{code}' was not found")))
    }
}
