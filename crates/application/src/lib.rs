//! Application services and ports.

#![forbid(unsafe_code)]

mod effective_permission_service;
mod permission_cache_service;
mod permission_discovery_service;
mod permission_guard;
mod permission_ports;
mod role_admin_service;

#[cfg(test)]
mod test_support;

pub use effective_permission_service::EffectivePermissionService;
pub use permission_cache_service::{DEFAULT_PERMISSION_CACHE_TTL_SECONDS, PermissionCacheService};
pub use permission_discovery_service::{DiscoveredPermission, PermissionDiscoveryService};
pub use permission_guard::{AllowReason, DenyReason, GuardDecision, PermissionGuard};
pub use permission_ports::{
    CreateRoleInput, GrantedPermission, NewPermission, PermissionCacheInvalidator,
    PermissionCacheStore, PermissionRegistryRepository, PermissionSyncPlan, PermissionSyncReport,
    PersonRoleAssignment, PersonRoleGrants, RoleRepository, RolePermissionToggle, RouteCatalog,
    StaticRouteCatalog, UpdateRoleInput,
};
pub use role_admin_service::{
    CreatePermissionInput, PermissionCategory, PermissionDashboardStats, RoleAdminService,
};
