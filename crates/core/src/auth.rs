use serde::{Deserialize, Serialize};

use crate::PersonId;

/// Permission snapshot carried by an authenticated session.
///
/// `bits` is the decimal form of the aggregate permission bitfield. It is kept
/// as a string because the value routinely exceeds native integer range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPermissions {
    /// Decimal-encoded aggregate bitfield.
    pub bits: String,
    /// Whether the principal bypasses bit checks entirely.
    pub is_super_admin: bool,
}

impl SessionPermissions {
    /// Snapshot for a principal without any grants.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bits: "0".to_owned(),
            is_super_admin: false,
        }
    }
}

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    person_id: PersonId,
    display_name: String,
    permissions: SessionPermissions,
}

impl UserIdentity {
    /// Creates a user identity from the authenticated person and its permission snapshot.
    #[must_use]
    pub fn new(
        person_id: PersonId,
        display_name: impl Into<String>,
        permissions: SessionPermissions,
    ) -> Self {
        Self {
            person_id,
            display_name: display_name.into(),
            permissions,
        }
    }

    /// Returns the person behind the session.
    #[must_use]
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the permission snapshot issued at login or refresh.
    #[must_use]
    pub fn permissions(&self) -> &SessionPermissions {
        &self.permissions
    }

    /// Returns a copy of the identity carrying a fresh permission snapshot.
    #[must_use]
    pub fn with_permissions(mut self, permissions: SessionPermissions) -> Self {
        self.permissions = permissions;
        self
    }
}
