//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_permission_cache_store;
mod postgres_permission_registry_repository;
mod postgres_role_repository;
mod redis_permission_cache_store;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_permission_cache_store::InMemoryPermissionCacheStore;
pub use postgres_permission_registry_repository::PostgresPermissionRegistryRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use redis_permission_cache_store::RedisPermissionCacheStore;
