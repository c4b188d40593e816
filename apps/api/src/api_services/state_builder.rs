use std::sync::Arc;

use permbit_application::{
    EffectivePermissionService, PermissionCacheInvalidator, PermissionCacheService,
    PermissionDiscoveryService, PermissionGuard, PermissionRegistryRepository, RoleAdminService,
    RoleRepository, RouteCatalog,
};
use permbit_core::AppError;
use permbit_infrastructure::{PostgresPermissionRegistryRepository, PostgresRoleRepository};
use sqlx::PgPool;

use crate::api_config::{ApiConfig, PermissionCacheBackend};
use crate::route_permissions::route_permission_catalog;
use crate::state::AppState;

use super::redis::build_redis_client;

mod caches;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let registry: Arc<dyn PermissionRegistryRepository> =
        Arc::new(PostgresPermissionRegistryRepository::new(pool.clone()));
    let roles: Arc<dyn RoleRepository> = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let cache_store = caches::build_permission_cache_store(config, redis_client.clone())?;

    let permission_cache_service = PermissionCacheService::new(
        cache_store,
        registry.clone(),
        roles.clone(),
        config.permission_cache_ttl_seconds,
    );
    let invalidator: Arc<dyn PermissionCacheInvalidator> =
        Arc::new(permission_cache_service.clone());
    let route_catalog = Arc::new(route_permission_catalog());
    let discovery_catalog: Arc<dyn RouteCatalog> = route_catalog.clone();

    Ok(AppState {
        role_admin_service: RoleAdminService::new(
            registry.clone(),
            roles.clone(),
            invalidator.clone(),
        ),
        effective_permission_service: EffectivePermissionService::new(
            roles,
            permission_cache_service.clone(),
        ),
        permission_discovery_service: PermissionDiscoveryService::new(
            discovery_catalog,
            registry,
            invalidator,
        ),
        permission_guard: PermissionGuard::new(
            permission_cache_service.clone(),
            config.permission_guard_debug,
        ),
        permission_cache_service,
        route_catalog,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
        postgres_pool: pool,
        redis_client,
        redis_required: config.permission_cache_backend == PermissionCacheBackend::Redis,
    })
}
