use std::sync::Arc;

use permbit_application::PermissionCacheStore;
use permbit_core::{AppError, AppResult};
use permbit_infrastructure::{InMemoryPermissionCacheStore, RedisPermissionCacheStore};

use crate::api_config::{ApiConfig, PermissionCacheBackend};

pub(super) fn build_permission_cache_store(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<Arc<dyn PermissionCacheStore>> {
    match config.permission_cache_backend {
        PermissionCacheBackend::InMemory => Ok(Arc::new(InMemoryPermissionCacheStore::new())),
        PermissionCacheBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
                )
            })?;
            Ok(Arc::new(RedisPermissionCacheStore::new(
                redis_client,
                "permbit",
            )))
        }
    }
}
