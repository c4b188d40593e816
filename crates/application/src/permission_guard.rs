use permbit_core::{AppError, AppResult, UserIdentity};
use permbit_domain::{PermissionBitfield, RouteDeclaration};
use tracing::{debug, error};

use crate::PermissionCacheService;

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// The route declares no permission.
    NoRequirement,
    /// The principal carries the super-admin flag.
    SuperAdmin,
    /// Every required bit is present.
    PermissionsGranted,
}

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// A permission is required but no principal is authenticated.
    Unauthenticated,
    /// The session carries an unreadable bitfield.
    MalformedSession,
    /// A required code is unknown or deprecated.
    UnresolvedPermission,
    /// At least one required bit is missing.
    MissingPermission,
}

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Request may proceed.
    Allow(AllowReason),
    /// Request must be rejected.
    Deny(DenyReason),
}

impl GuardDecision {
    /// Returns true for allow decisions.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Enforcement point checking a route requirement against the bitfield carried
/// by the principal's session.
///
/// The happy path needs no registry access: required codes resolve through the
/// permission cache and the principal's bits come from the session.
#[derive(Clone)]
pub struct PermissionGuard {
    cache: PermissionCacheService,
    debug_enabled: bool,
}

impl PermissionGuard {
    /// Creates a guard. `debug_enabled` turns on per-check diagnostics.
    #[must_use]
    pub fn new(cache: PermissionCacheService, debug_enabled: bool) -> Self {
        Self {
            cache,
            debug_enabled,
        }
    }

    /// Evaluates a route requirement for an optional principal.
    ///
    /// Cache and registry failures are returned as errors after being logged
    /// with the handler and required codes.
    pub async fn evaluate(
        &self,
        route: &RouteDeclaration,
        principal: Option<&UserIdentity>,
    ) -> AppResult<GuardDecision> {
        if route.required_permissions.is_empty() {
            return Ok(GuardDecision::Allow(AllowReason::NoRequirement));
        }

        let Some(principal) = principal else {
            return Ok(GuardDecision::Deny(DenyReason::Unauthenticated));
        };

        let session_permissions = principal.permissions();
        if session_permissions.is_super_admin {
            if self.debug_enabled {
                debug!(
                    handler = %route.handler,
                    required = ?route.required_permissions,
                    "super-admin bypass"
                );
            }
            return Ok(GuardDecision::Allow(AllowReason::SuperAdmin));
        }

        let Ok(held) = PermissionBitfield::from_decimal(session_permissions.bits.as_str()) else {
            return Ok(GuardDecision::Deny(DenyReason::MalformedSession));
        };

        let codes: Vec<&str> = route
            .required_permissions
            .iter()
            .map(String::as_str)
            .collect();
        let resolved = self
            .cache
            .get_permission_bitfields(&codes)
            .await
            .inspect_err(|lookup_error| {
                error!(
                    handler = %route.handler,
                    required = ?route.required_permissions,
                    error = %lookup_error,
                    "permission lookup failed"
                );
            })?;

        let mut decision = GuardDecision::Allow(AllowReason::PermissionsGranted);
        for (code, required) in codes.iter().zip(resolved.iter()) {
            let passed = match required {
                Some(required) => held.contains(required),
                None => false,
            };

            if self.debug_enabled {
                debug!(
                    handler = %route.handler,
                    code,
                    held = %held,
                    required = ?required.as_ref().map(PermissionBitfield::to_decimal),
                    passed,
                    "permission check"
                );
            }

            if required.is_none() {
                decision = GuardDecision::Deny(DenyReason::UnresolvedPermission);
                break;
            }
            if !passed {
                decision = GuardDecision::Deny(DenyReason::MissingPermission);
                break;
            }
        }

        Ok(decision)
    }

    /// Evaluates a route requirement and converts denials into errors.
    ///
    /// Denials never name the failing permission.
    pub async fn authorize(
        &self,
        route: &RouteDeclaration,
        principal: Option<&UserIdentity>,
    ) -> AppResult<()> {
        match self.evaluate(route, principal).await? {
            GuardDecision::Allow(_) => Ok(()),
            GuardDecision::Deny(DenyReason::Unauthenticated) => Err(AppError::Unauthorized(
                "authentication required".to_owned(),
            )),
            GuardDecision::Deny(DenyReason::MalformedSession) => Err(AppError::Unauthorized(
                "session permissions are invalid, sign in again".to_owned(),
            )),
            GuardDecision::Deny(_) => Err(AppError::Forbidden(
                "insufficient permissions".to_owned(),
            )),
        }
    }
}
