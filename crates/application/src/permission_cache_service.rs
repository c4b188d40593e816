use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use permbit_core::{AppError, AppResult, PersonId};
use permbit_domain::{PermissionBitfield, PermissionCode, PermissionDefinition};
use tracing::{debug, warn};

use crate::permission_ports::{
    PermissionCacheInvalidator, PermissionCacheStore, PermissionRegistryRepository,
    RoleRepository,
};

const BITFIELD_KEY_PREFIX: &str = "perm:bitfield";
const CATEGORY_KEY_PREFIX: &str = "perm:category";
const EFFECTIVE_KEY_PREFIX: &str = "perm:effective";

/// Default time to live for every permission cache entry.
pub const DEFAULT_PERMISSION_CACHE_TTL_SECONDS: u32 = 300;

pub(crate) fn bitfield_key(code: &str) -> String {
    format!("{BITFIELD_KEY_PREFIX}:{code}")
}

pub(crate) fn category_key(category: &str) -> String {
    format!("{CATEGORY_KEY_PREFIX}:{category}")
}

pub(crate) fn effective_key(person_id: PersonId) -> String {
    format!("{EFFECTIVE_KEY_PREFIX}:{person_id}")
}

/// Cache layer in front of the permission registry and the effective
/// permission calculator.
///
/// Lookups fail closed: a backend error is returned to the caller instead of
/// being treated as a miss.
#[derive(Clone)]
pub struct PermissionCacheService {
    store: Arc<dyn PermissionCacheStore>,
    registry: Arc<dyn PermissionRegistryRepository>,
    roles: Arc<dyn RoleRepository>,
    ttl_seconds: u32,
}

impl PermissionCacheService {
    /// Creates a cache service.
    #[must_use]
    pub fn new(
        store: Arc<dyn PermissionCacheStore>,
        registry: Arc<dyn PermissionRegistryRepository>,
        roles: Arc<dyn RoleRepository>,
        ttl_seconds: u32,
    ) -> Self {
        Self {
            store,
            registry,
            roles,
            ttl_seconds,
        }
    }

    /// Returns the configured entry time to live.
    #[must_use]
    pub fn ttl_seconds(&self) -> u32 {
        self.ttl_seconds
    }

    /// Resolves bitfields for `codes`, preserving input order.
    ///
    /// `None` marks a code that is unknown or deprecated; callers must treat it
    /// as a failed check.
    pub async fn get_permission_bitfields(
        &self,
        codes: &[&str],
    ) -> AppResult<Vec<Option<PermissionBitfield>>> {
        let mut resolved = Vec::with_capacity(codes.len());
        for code in codes {
            resolved.push(self.get_permission_bitfield(code).await?);
        }

        Ok(resolved)
    }

    /// Resolves one bitfield, cache first.
    pub async fn get_permission_bitfield(&self, code: &str) -> AppResult<Option<PermissionBitfield>> {
        let key = bitfield_key(code);
        if let Some(cached) = self.store.get(key.as_str()).await? {
            return decode_bitfield(key.as_str(), cached.as_str()).map(Some);
        }

        let Some(permission) = self.registry.find_permission_by_code(code).await? else {
            return Ok(None);
        };

        if permission.is_deprecated {
            return Ok(None);
        }

        self.store
            .set(
                key.as_str(),
                permission.bitfield.to_decimal().as_str(),
                self.ttl_seconds,
            )
            .await?;

        Ok(Some(permission.bitfield))
    }

    /// Returns the active codes of one category, cache first.
    pub async fn get_category_codes(&self, category: &str) -> AppResult<Vec<PermissionCode>> {
        let key = category_key(category);
        if let Some(cached) = self.store.get(key.as_str()).await? {
            return decode_codes(key.as_str(), cached.as_str());
        }

        let codes: Vec<PermissionCode> = self
            .registry
            .list_permissions()
            .await?
            .into_iter()
            .filter(|permission| permission.is_active() && permission.category == category)
            .map(|permission| permission.code)
            .collect();

        self.store
            .set(key.as_str(), encode_codes(&codes).as_str(), self.ttl_seconds)
            .await?;

        Ok(codes)
    }

    /// Returns the cached effective permissions of a person, if present.
    pub async fn cached_effective_permissions(
        &self,
        person_id: PersonId,
    ) -> AppResult<Option<PermissionBitfield>> {
        let key = effective_key(person_id);
        self.store
            .get(key.as_str())
            .await?
            .map(|cached| decode_bitfield(key.as_str(), cached.as_str()))
            .transpose()
    }

    /// Stores the effective permissions of a person.
    pub async fn store_effective_permissions(
        &self,
        person_id: PersonId,
        bitfield: &PermissionBitfield,
    ) -> AppResult<()> {
        self.store
            .set(
                effective_key(person_id).as_str(),
                bitfield.to_decimal().as_str(),
                self.ttl_seconds,
            )
            .await
    }

    /// Populates code and category entries at startup.
    ///
    /// Errors are logged and swallowed: checks fall back to the registry.
    pub async fn warm_up(&self) {
        match self.registry.list_permissions().await {
            Ok(permissions) => {
                if let Err(error) = self.populate(&permissions).await {
                    warn!(error = %error, "permission cache warm-up failed");
                }
            }
            Err(error) => {
                warn!(error = %error, "permission cache warm-up could not read the registry");
            }
        }
    }

    async fn populate(&self, permissions: &[PermissionDefinition]) -> AppResult<()> {
        let mut categories: BTreeMap<&str, Vec<PermissionCode>> = BTreeMap::new();
        for permission in permissions.iter().filter(|permission| permission.is_active()) {
            self.store
                .set(
                    bitfield_key(permission.code.as_str()).as_str(),
                    permission.bitfield.to_decimal().as_str(),
                    self.ttl_seconds,
                )
                .await?;
            categories
                .entry(permission.category.as_str())
                .or_default()
                .push(permission.code.clone());
        }

        for (category, codes) in &categories {
            self.store
                .set(
                    category_key(category).as_str(),
                    encode_codes(codes).as_str(),
                    self.ttl_seconds,
                )
                .await?;
        }

        debug!(
            permissions = permissions.len(),
            categories = categories.len(),
            "permission cache populated"
        );

        Ok(())
    }
}

#[async_trait]
impl PermissionCacheInvalidator for PermissionCacheService {
    async fn clear_person_permission_cache(&self, person_id: PersonId) -> AppResult<()> {
        self.store.delete(effective_key(person_id).as_str()).await
    }

    async fn clear_role_permission_cache(&self, role_id: &str) -> AppResult<()> {
        let holders = self.roles.list_role_holders(role_id).await?;
        for person_id in &holders {
            self.clear_person_permission_cache(*person_id).await?;
        }

        debug!(role_id, holders = holders.len(), "cleared role holder permission caches");
        Ok(())
    }

    async fn invalidate_permission_cache(&self) -> AppResult<()> {
        let permissions = self.registry.list_permissions().await?;

        let mut categories: Vec<&str> = Vec::new();
        for permission in &permissions {
            self.store
                .delete(bitfield_key(permission.code.as_str()).as_str())
                .await?;
            if !categories.contains(&permission.category.as_str()) {
                categories.push(permission.category.as_str());
            }
        }

        for category in categories {
            self.store.delete(category_key(category).as_str()).await?;
        }

        self.populate(&permissions).await
    }
}

fn decode_bitfield(key: &str, value: &str) -> AppResult<PermissionBitfield> {
    PermissionBitfield::from_decimal(value).map_err(|error| {
        AppError::Internal(format!("invalid permission cache entry '{key}': {error}"))
    })
}

fn encode_codes(codes: &[PermissionCode]) -> String {
    codes
        .iter()
        .map(PermissionCode::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_codes(key: &str, value: &str) -> AppResult<Vec<PermissionCode>> {
    value
        .split(',')
        .filter(|code| !code.is_empty())
        .map(|code| {
            PermissionCode::new(code).map_err(|error| {
                AppError::Internal(format!("invalid permission cache entry '{key}': {error}"))
            })
        })
        .collect()
}
