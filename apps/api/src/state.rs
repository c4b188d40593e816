use std::sync::Arc;

use permbit_application::{
    EffectivePermissionService, PermissionCacheService, PermissionDiscoveryService,
    PermissionGuard, RoleAdminService, StaticRouteCatalog,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub role_admin_service: RoleAdminService,
    pub effective_permission_service: EffectivePermissionService,
    pub permission_cache_service: PermissionCacheService,
    pub permission_discovery_service: PermissionDiscoveryService,
    pub permission_guard: PermissionGuard,
    pub route_catalog: Arc<StaticRouteCatalog>,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub postgres_pool: sqlx::PgPool,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
}
