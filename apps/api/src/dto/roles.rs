use permbit_application::RolePermissionToggle;
use permbit_domain::{PermissionCode, RoleDefinition};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::permissions::codes_to_strings;

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub sort_order: i32,
    pub permissions: Vec<String>,
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role_id: value.role_id,
            name: value.name,
            description: value.description,
            is_system: value.is_system,
            sort_order: value.sort_order,
            permissions: codes_to_strings(value.permissions),
        }
    }
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload for role updates. Absent fields are left unchanged.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/reorder-role-request.ts"
)]
pub struct ReorderRoleRequest {
    /// Target position, starting at 1.
    pub position: i32,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-permission-toggle-response.ts"
)]
pub struct RolePermissionToggleResponse {
    pub code: String,
    pub granted: bool,
}

impl RolePermissionToggleResponse {
    pub fn new(code: PermissionCode, toggle: RolePermissionToggle) -> Self {
        Self {
            code: code.into(),
            granted: toggle == RolePermissionToggle::Granted,
        }
    }
}
