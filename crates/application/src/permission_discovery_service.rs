use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use permbit_core::AppResult;
use permbit_domain::{PermissionBitfield, PermissionCode};
use tracing::{error, info, warn};

use crate::permission_ports::{
    NewPermission, PermissionCacheInvalidator, PermissionRegistryRepository, PermissionSyncPlan,
    PermissionSyncReport, RouteCatalog,
};

/// Permission record produced by one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPermission {
    /// Declared code.
    pub code: PermissionCode,
    /// Display name derived from the action.
    pub name: String,
    /// Category derived from the code prefix.
    pub category: String,
    /// Description derived from the code.
    pub description: String,
    /// Position in discovery order, starting at 1.
    pub sort_order: i32,
    /// Stored bitfield, or the provisional one for new codes.
    pub bitfield: PermissionBitfield,
    /// True when the registry does not know the code yet.
    pub is_new: bool,
}

/// Keeps the permission registry aligned with the codes declared by routes.
///
/// Bitfield assignment reads the registry maximum and is not safe when two
/// processes discover at the same time; run it from a single instance.
#[derive(Clone)]
pub struct PermissionDiscoveryService {
    catalog: Arc<dyn RouteCatalog>,
    registry: Arc<dyn PermissionRegistryRepository>,
    invalidator: Arc<dyn PermissionCacheInvalidator>,
}

impl PermissionDiscoveryService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn RouteCatalog>,
        registry: Arc<dyn PermissionRegistryRepository>,
        invalidator: Arc<dyn PermissionCacheInvalidator>,
    ) -> Self {
        Self {
            catalog,
            registry,
            invalidator,
        }
    }

    /// Scans declared routes and returns every valid code, sorted by category
    /// then name, with stored or provisional bitfields.
    ///
    /// Malformed codes are logged and skipped. New codes receive consecutive
    /// doublings of the highest bitfield ever assigned.
    pub async fn discover_permissions(&self) -> AppResult<Vec<DiscoveredPermission>> {
        let declared = self.declared_codes();

        let stored: BTreeMap<String, PermissionBitfield> = self
            .registry
            .list_permissions()
            .await?
            .into_iter()
            .map(|permission| (permission.code.as_str().to_owned(), permission.bitfield))
            .collect();
        let mut next_bitfield =
            PermissionBitfield::next_after(self.registry.highest_bitfield().await?.as_ref());

        let mut ordered: Vec<PermissionCode> = declared.into_iter().collect();
        ordered.sort_by(|left, right| {
            left.category()
                .cmp(right.category())
                .then_with(|| left.display_name().cmp(&right.display_name()))
                .then_with(|| left.cmp(right))
        });

        let mut discovered = Vec::with_capacity(ordered.len());
        for (index, code) in ordered.into_iter().enumerate() {
            let (bitfield, is_new) = match stored.get(code.as_str()) {
                Some(bitfield) => (bitfield.clone(), false),
                None => {
                    let assigned = next_bitfield.clone();
                    next_bitfield = next_bitfield.doubled();
                    (assigned, true)
                }
            };

            discovered.push(DiscoveredPermission {
                name: code.display_name(),
                category: code.category().to_owned(),
                description: code.default_description(),
                sort_order: i32::try_from(index + 1).unwrap_or(i32::MAX),
                bitfield,
                is_new,
                code,
            });
        }

        Ok(discovered)
    }

    /// Runs discovery and reconciles the registry in one transaction, then
    /// refreshes the code and category cache entries and clears the effective
    /// permissions of every holder of a role whose grants changed.
    ///
    /// Running twice without code changes mutates nothing the second time.
    pub async fn sync_permissions(&self) -> AppResult<PermissionSyncReport> {
        let discovered = self.discover_permissions().await?;

        let plan = PermissionSyncPlan {
            declared_codes: discovered
                .iter()
                .map(|permission| permission.code.clone())
                .collect(),
            to_insert: discovered
                .into_iter()
                .filter(|permission| permission.is_new)
                .map(|permission| NewPermission {
                    code: permission.code,
                    category: permission.category,
                    name: permission.name,
                    description: Some(permission.description),
                    sort_order: permission.sort_order,
                    bitfield: permission.bitfield,
                })
                .collect(),
        };

        let report = self.registry.apply_sync(plan).await?;
        self.invalidator.invalidate_permission_cache().await?;
        for role_id in &report.affected_role_ids {
            self.invalidator
                .clear_role_permission_cache(role_id.as_str())
                .await?;
        }

        info!(
            inserted = report.inserted.len(),
            deprecated = report.deprecated.len(),
            restored = report.restored.len(),
            super_admin_grants = report.super_admin_grants,
            affected_roles = report.affected_role_ids.len(),
            "permission registry synchronized"
        );

        Ok(report)
    }

    /// Startup hook: runs a sync and logs failures instead of returning them so
    /// the process stays reachable. Checks against undiscovered codes deny
    /// until a later sync succeeds.
    pub async fn sync_on_startup(&self) -> Option<PermissionSyncReport> {
        match self.sync_permissions().await {
            Ok(report) => Some(report),
            Err(sync_error) => {
                error!(
                    error = %sync_error,
                    "permission sync failed at startup, continuing without it"
                );
                None
            }
        }
    }

    fn declared_codes(&self) -> BTreeSet<PermissionCode> {
        let mut codes = BTreeSet::new();
        for declaration in self.catalog.declarations() {
            for raw_code in &declaration.required_permissions {
                match PermissionCode::new(raw_code.as_str()) {
                    Ok(code) => {
                        codes.insert(code);
                    }
                    Err(validation_error) => warn!(
                        handler = %declaration.handler,
                        code = %raw_code,
                        error = %validation_error,
                        "skipping malformed permission code"
                    ),
                }
            }
        }

        codes
    }
}

#[cfg(test)]
mod tests;
