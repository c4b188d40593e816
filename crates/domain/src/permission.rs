use std::fmt::{Display, Formatter};
use std::str::FromStr;

use permbit_core::AppError;
use serde::{Deserialize, Serialize};

use crate::PermissionBitfield;

/// Validated permission code in the form `<category>.<action>`.
///
/// Both segments start with a lowercase ASCII letter and may contain lowercase
/// letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Parses and validates a permission code.
    pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        let Some((category, action)) = value.split_once('.') else {
            return Err(AppError::Validation(format!(
                "permission code '{value}' must look like 'category.action'"
            )));
        };

        if !is_valid_segment(category) || !is_valid_segment(action) {
            return Err(AppError::Validation(format!(
                "permission code '{value}' must look like 'category.action'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the segment before the dot.
    #[must_use]
    pub fn category(&self) -> &str {
        self.0.split_once('.').map_or("", |(category, _)| category)
    }

    /// Returns the segment after the dot.
    #[must_use]
    pub fn action(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, action)| action)
    }

    /// Human-readable name derived from the action, e.g. `assign_roles` becomes
    /// `Assign roles`.
    #[must_use]
    pub fn display_name(&self) -> String {
        humanize(self.action())
    }

    /// Default description derived from both segments.
    #[must_use]
    pub fn default_description(&self) -> String {
        format!(
            "{} {}",
            self.display_name(),
            self.category().replace(['_', '-'], " ")
        )
    }
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    first.is_ascii_lowercase()
        && chars.all(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || character == '_'
                || character == '-'
        })
}

fn humanize(segment: &str) -> String {
    let spaced = segment.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl FromStr for PermissionCode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionCode> for String {
    fn from(value: PermissionCode) -> Self {
        value.0
    }
}

impl Display for PermissionCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Registry record of one permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Stable registry identifier.
    pub permission_id: String,
    /// Globally unique code, immutable once created.
    pub code: PermissionCode,
    /// Grouping used by category listings.
    pub category: String,
    /// Display name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Display ordering.
    pub sort_order: i32,
    /// Single-bit value owned by this permission. Never reused.
    pub bitfield: PermissionBitfield,
    /// Set once the code is no longer declared by any route.
    pub is_deprecated: bool,
}

impl PermissionDefinition {
    /// Returns true when the permission may be granted and checked.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_deprecated
    }
}
