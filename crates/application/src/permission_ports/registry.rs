use async_trait::async_trait;
use permbit_core::AppResult;
use permbit_domain::{PermissionBitfield, PermissionCode, PermissionDefinition};

/// Permission row to insert into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    /// Unique code.
    pub code: PermissionCode,
    /// Category, the code prefix.
    pub category: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Display ordering.
    pub sort_order: i32,
    /// Pre-assigned single-bit value.
    pub bitfield: PermissionBitfield,
}

/// Reconciliation request produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionSyncPlan {
    /// Codes declared in code but absent from storage.
    pub to_insert: Vec<NewPermission>,
    /// Every valid code currently declared in code.
    pub declared_codes: Vec<PermissionCode>,
}

/// Mutations applied by one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionSyncReport {
    /// Codes inserted into the registry.
    pub inserted: Vec<PermissionCode>,
    /// Codes newly flagged as deprecated.
    pub deprecated: Vec<PermissionCode>,
    /// Deprecated codes declared again and reactivated.
    pub restored: Vec<PermissionCode>,
    /// Grants added to the super-admin role.
    pub super_admin_grants: usize,
    /// Roles whose effective grants changed: the super-admin role when it
    /// received grants, and every role granting a deprecated or restored code.
    /// Their holders' cached effective permissions are stale after the run.
    pub affected_role_ids: Vec<String>,
}

impl PermissionSyncReport {
    /// Returns true when the run changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty()
            && self.deprecated.is_empty()
            && self.restored.is_empty()
            && self.super_admin_grants == 0
    }
}

/// Durable store of permission codes and their bitfields.
#[async_trait]
pub trait PermissionRegistryRepository: Send + Sync {
    /// Lists every permission, deprecated ones included, by category then sort order.
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDefinition>>;

    /// Finds one permission by code, deprecated or not.
    async fn find_permission_by_code(&self, code: &str) -> AppResult<Option<PermissionDefinition>>;

    /// Returns the highest bitfield ever assigned, deprecated permissions included.
    async fn highest_bitfield(&self) -> AppResult<Option<PermissionBitfield>>;

    /// Inserts one permission. Fails with a conflict when the code exists.
    async fn create_permission(&self, input: NewPermission) -> AppResult<PermissionDefinition>;

    /// Applies a discovery plan atomically: inserts missing codes, grants them
    /// to the super-admin role when present, deprecates codes that are no
    /// longer declared and restores re-declared ones.
    async fn apply_sync(&self, plan: PermissionSyncPlan) -> AppResult<PermissionSyncReport>;
}
