use permbit_application::{DiscoveredPermission, PermissionCategory, PermissionSyncReport};
use permbit_domain::{PermissionCode, PermissionDefinition};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a registry permission.
///
/// Bitfields travel as decimal strings since they outgrow JSON numbers.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission_id: String,
    pub code: String,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub bitfield: String,
    pub is_deprecated: bool,
}

impl From<PermissionDefinition> for PermissionResponse {
    fn from(value: PermissionDefinition) -> Self {
        Self {
            permission_id: value.permission_id,
            code: value.code.into(),
            category: value.category,
            name: value.name,
            description: value.description,
            sort_order: value.sort_order,
            bitfield: value.bitfield.to_decimal(),
            is_deprecated: value.is_deprecated,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPermissionsQuery {
    #[serde(default)]
    pub include_deprecated: bool,
}

/// Incoming payload for manual permission registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-category-response.ts"
)]
pub struct PermissionCategoryResponse {
    pub category: String,
    pub codes: Vec<String>,
}

impl From<PermissionCategory> for PermissionCategoryResponse {
    fn from(value: PermissionCategory) -> Self {
        Self {
            category: value.category,
            codes: codes_to_strings(value.codes),
        }
    }
}

/// Active codes of one category, served from the permission cache.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/category-codes-response.ts"
)]
pub struct CategoryCodesResponse {
    pub category: String,
    pub codes: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/discovered-permission-response.ts"
)]
pub struct DiscoveredPermissionResponse {
    pub code: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub sort_order: i32,
    pub bitfield: String,
    pub is_new: bool,
}

impl From<DiscoveredPermission> for DiscoveredPermissionResponse {
    fn from(value: DiscoveredPermission) -> Self {
        Self {
            code: value.code.into(),
            name: value.name,
            category: value.category,
            description: value.description,
            sort_order: value.sort_order,
            bitfield: value.bitfield.to_decimal(),
            is_new: value.is_new,
        }
    }
}

/// Summary of one registry synchronization.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-sync-response.ts"
)]
pub struct PermissionSyncResponse {
    pub inserted: Vec<String>,
    pub deprecated: Vec<String>,
    pub restored: Vec<String>,
    pub super_admin_grants: u32,
}

impl From<PermissionSyncReport> for PermissionSyncResponse {
    fn from(value: PermissionSyncReport) -> Self {
        Self {
            inserted: codes_to_strings(value.inserted),
            deprecated: codes_to_strings(value.deprecated),
            restored: codes_to_strings(value.restored),
            super_admin_grants: u32::try_from(value.super_admin_grants).unwrap_or(u32::MAX),
        }
    }
}

pub(super) fn codes_to_strings(codes: Vec<PermissionCode>) -> Vec<String> {
    codes.into_iter().map(String::from).collect()
}
