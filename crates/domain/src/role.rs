use serde::{Deserialize, Serialize};

use crate::PermissionCode;

/// Name of the system role that bypasses every bit check.
pub const SUPER_ADMIN_ROLE_NAME: &str = "SUPER_ADMIN";

/// Returns true when the role name designates the super-admin role.
#[must_use]
pub fn is_super_admin_role(role_name: &str) -> bool {
    role_name == SUPER_ADMIN_ROLE_NAME
}

/// Role definition with its granted permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub role_id: String,
    /// Unique role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// System roles cannot be modified through the management API.
    pub is_system: bool,
    /// Contiguous display and priority ordering.
    pub sort_order: i32,
    /// Codes granted to the role.
    pub permissions: Vec<PermissionCode>,
}

impl RoleDefinition {
    /// Returns true when the role is the super-admin role.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        is_super_admin_role(self.name.as_str())
    }
}
