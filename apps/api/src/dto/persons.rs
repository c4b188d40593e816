use permbit_application::{PermissionDashboardStats, PersonRoleAssignment};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/person-role-response.ts"
)]
pub struct PersonRoleResponse {
    pub person_id: String,
    pub role_id: String,
    pub role_name: String,
    pub assigned_at: String,
}

impl From<PersonRoleAssignment> for PersonRoleResponse {
    fn from(value: PersonRoleAssignment) -> Self {
        Self {
            person_id: value.person_id.to_string(),
            role_id: value.role_id,
            role_name: value.role_name,
            assigned_at: value.assigned_at,
        }
    }
}

/// Aggregate bitfield of a person, as a decimal string.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/effective-permissions-response.ts"
)]
pub struct EffectivePermissionsResponse {
    pub person_id: String,
    pub bitfield: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/has-permission-response.ts"
)]
pub struct HasPermissionResponse {
    pub person_id: String,
    pub code: String,
    pub granted: bool,
}

/// Counters for the administration dashboard.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/dashboard-stats-response.ts"
)]
pub struct DashboardStatsResponse {
    pub active_permissions: u32,
    pub deprecated_permissions: u32,
    pub categories: u32,
    pub roles: u32,
    pub system_roles: u32,
    pub role_assignments: u32,
}

impl From<PermissionDashboardStats> for DashboardStatsResponse {
    fn from(value: PermissionDashboardStats) -> Self {
        let count = |value: usize| u32::try_from(value).unwrap_or(u32::MAX);
        Self {
            active_permissions: count(value.active_permissions),
            deprecated_permissions: count(value.deprecated_permissions),
            categories: count(value.categories),
            roles: count(value.roles),
            system_roles: count(value.system_roles),
            role_assignments: u32::try_from(value.role_assignments).unwrap_or(u32::MAX),
        }
    }
}
