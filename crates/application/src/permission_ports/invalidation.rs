use async_trait::async_trait;
use permbit_core::{AppResult, PersonId};

/// Invalidation hooks called by every write path that changes permissions.
#[async_trait]
pub trait PermissionCacheInvalidator: Send + Sync {
    /// Drops the cached effective permissions of one person.
    async fn clear_person_permission_cache(&self, person_id: PersonId) -> AppResult<()>;

    /// Drops the cached effective permissions of every holder of a role.
    async fn clear_role_permission_cache(&self, role_id: &str) -> AppResult<()>;

    /// Drops and repopulates every code and category entry.
    async fn invalidate_permission_cache(&self) -> AppResult<()>;
}
