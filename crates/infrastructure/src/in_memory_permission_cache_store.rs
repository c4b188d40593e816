use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use permbit_application::PermissionCacheStore;
use permbit_core::AppResult;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct PermissionCacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory permission cache store for single-instance deployments.
///
/// Expired entries are dropped when read and swept on every write, so keys
/// that are never read again do not accumulate.
#[derive(Default)]
pub struct InMemoryPermissionCacheStore {
    entries: RwLock<HashMap<String, PermissionCacheEntry>>,
}

impl InMemoryPermissionCacheStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionCacheStore for InMemoryPermissionCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.value.clone()));
                }
            } else {
                return Ok(None);
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_owned(),
            PermissionCacheEntry {
                value: value.to_owned(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
