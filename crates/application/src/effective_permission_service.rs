use std::sync::Arc;

use permbit_core::{AppResult, PersonId, SessionPermissions};
use permbit_domain::{PermissionBitfield, is_super_admin_role};
use tracing::debug;

use crate::PermissionCacheService;
use crate::permission_ports::RoleRepository;

/// Computes the aggregate permission bitfield of a person.
#[derive(Clone)]
pub struct EffectivePermissionService {
    roles: Arc<dyn RoleRepository>,
    cache: PermissionCacheService,
}

impl EffectivePermissionService {
    /// Creates the service.
    #[must_use]
    pub fn new(roles: Arc<dyn RoleRepository>, cache: PermissionCacheService) -> Self {
        Self { roles, cache }
    }

    /// Returns the union of every active bit granted to the person through any
    /// role. A person without roles yields zero.
    pub async fn calculate_effective_permissions(
        &self,
        person_id: PersonId,
    ) -> AppResult<PermissionBitfield> {
        if let Some(cached) = self.cache.cached_effective_permissions(person_id).await? {
            return Ok(cached);
        }

        let role_grants = self.roles.load_person_grants(person_id).await?;
        let effective = PermissionBitfield::union_of(
            role_grants
                .iter()
                .flat_map(|role| role.grants.iter())
                .filter(|grant| !grant.is_deprecated)
                .map(|grant| &grant.bitfield),
        );

        self.cache
            .store_effective_permissions(person_id, &effective)
            .await?;

        debug!(
            person_id = %person_id,
            roles = role_grants.len(),
            "computed effective permissions"
        );

        Ok(effective)
    }

    /// Returns whether the person holds the permission. Unknown and deprecated
    /// codes are never held.
    pub async fn has_permission(&self, person_id: PersonId, code: &str) -> AppResult<bool> {
        let Some(required) = self.cache.get_permission_bitfield(code).await? else {
            return Ok(false);
        };

        let effective = self.calculate_effective_permissions(person_id).await?;
        Ok(effective.contains(&required))
    }

    /// Builds the permission snapshot embedded in a session at login or
    /// refresh.
    pub async fn session_permissions(&self, person_id: PersonId) -> AppResult<SessionPermissions> {
        let is_super_admin = self
            .roles
            .list_person_roles(person_id)
            .await?
            .iter()
            .any(|assignment| is_super_admin_role(assignment.role_name.as_str()));

        let effective = self.calculate_effective_permissions(person_id).await?;

        Ok(SessionPermissions {
            bits: effective.to_decimal(),
            is_super_admin,
        })
    }
}
