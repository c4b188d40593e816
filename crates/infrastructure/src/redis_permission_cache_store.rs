//! Redis-backed permission cache store.

use async_trait::async_trait;
use permbit_application::PermissionCacheStore;
use permbit_core::{AppError, AppResult};
use redis::AsyncCommands;

/// Redis implementation of the permission cache store port.
#[derive(Clone)]
pub struct RedisPermissionCacheStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisPermissionCacheStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            return key.to_owned();
        }

        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl PermissionCacheStore for RedisPermissionCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;

        connection.get(self.key_for(key)).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to read permission cache entry '{key}': {error}"
            ))
        })
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let mut connection = self.connection().await?;

        connection
            .set_ex(self.key_for(key), value, u64::from(ttl_seconds))
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write permission cache entry '{key}': {error}"
                ))
            })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;

        connection.del(self.key_for(key)).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to delete permission cache entry '{key}': {error}"
            ))
        })
    }
}
