use permbit_core::UserIdentity;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
}

/// Status of one backing service.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub person_id: String,
    pub display_name: String,
    /// Decimal aggregate bitfield from the session snapshot.
    pub permission_bits: String,
    pub is_super_admin: bool,
}

impl From<UserIdentity> for UserIdentityResponse {
    fn from(value: UserIdentity) -> Self {
        Self {
            person_id: value.person_id().to_string(),
            display_name: value.display_name().to_owned(),
            permission_bits: value.permissions().bits.clone(),
            is_super_admin: value.permissions().is_super_admin,
        }
    }
}
