//! Identifiers, session principal and error taxonomy shared by the permbit
//! crates.

#![forbid(unsafe_code)]

/// Session principal and its permission snapshot.
pub mod auth;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::{SessionPermissions, UserIdentity};

/// Result of any permbit operation.
pub type AppResult<T> = Result<T, AppError>;

/// Text that holds at least one non-whitespace character, used for role names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Fails with a validation error on blank input.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Borrows the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Identifier of a person, the principal whose access is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(Uuid);

impl PersonId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps a UUID read from storage or a request.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the UUID used as the storage key.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PersonId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PersonId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid person id '{value}': {error}")))
    }
}

/// Failure categories of permbit operations.
///
/// The HTTP layer maps each variant to one status code. `Internal` details are
/// logged but never returned to clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input: a bad permission code, bitfield, name or setting.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown role, permission, person assignment or category.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate role name or permission code.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No session, an expired session, or an unreadable permission snapshot.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Signed-in person lacking a required permission bit, or a change to a
    /// system role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Storage, cache or session backend failure.
    #[error("internal error: {0}")]
    Internal(String),
}
