mod common;
mod permissions;
mod persons;
mod roles;

pub use common::{HealthDependencyStatus, HealthResponse, UserIdentityResponse};
pub use permissions::{
    CategoryCodesResponse, CreatePermissionRequest, DiscoveredPermissionResponse,
    ListPermissionsQuery, PermissionCategoryResponse, PermissionResponse, PermissionSyncResponse,
};
pub use persons::{
    DashboardStatsResponse, EffectivePermissionsResponse, HasPermissionResponse,
    PersonRoleResponse,
};
pub use roles::{
    CreateRoleRequest, ReorderRoleRequest, RolePermissionToggleResponse, RoleResponse,
    UpdateRoleRequest,
};
