use serde::{Deserialize, Serialize};

/// Permission requirement declared for one request handler.
///
/// Codes are kept as raw strings: declarations are authored by hand and
/// validated during discovery, where malformed entries are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDeclaration {
    /// Handler identifier used in diagnostics.
    pub handler: String,
    /// HTTP method in upper case.
    pub method: String,
    /// Route path template as registered with the router.
    pub path: String,
    /// Codes required by the handler, all of them (conjunctive).
    pub required_permissions: Vec<String>,
}

impl RouteDeclaration {
    /// Creates a declaration.
    #[must_use]
    pub fn new(
        handler: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        required_permissions: &[&str],
    ) -> Self {
        Self {
            handler: handler.into(),
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            required_permissions: required_permissions
                .iter()
                .map(|code| (*code).to_owned())
                .collect(),
        }
    }

    /// Returns true when this declaration describes the given method and path.
    #[must_use]
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.path == path && self.method.eq_ignore_ascii_case(method)
    }
}
