mod cache;
mod invalidation;
mod registry;
mod roles;
mod routes;

pub use cache::PermissionCacheStore;
pub use invalidation::PermissionCacheInvalidator;
pub use registry::{
    NewPermission, PermissionRegistryRepository, PermissionSyncPlan, PermissionSyncReport,
};
pub use roles::{
    CreateRoleInput, GrantedPermission, PersonRoleAssignment, PersonRoleGrants, RoleRepository,
    RolePermissionToggle, UpdateRoleInput,
};
pub use routes::{RouteCatalog, StaticRouteCatalog};
