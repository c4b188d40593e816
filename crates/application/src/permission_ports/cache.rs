use async_trait::async_trait;
use permbit_core::AppResult;

/// Key/value backend holding derived permission data.
///
/// Every entry is disposable. Implementations must surface backend failures as
/// errors instead of reporting a miss.
#[async_trait]
pub trait PermissionCacheStore: Send + Sync {
    /// Reads one entry.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Writes one entry with a time to live in seconds.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u32) -> AppResult<()>;

    /// Removes one entry. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}
