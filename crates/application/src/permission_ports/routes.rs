use permbit_domain::RouteDeclaration;

/// Source of the permission requirements declared by request handlers.
pub trait RouteCatalog: Send + Sync {
    /// Returns every registered handler with its declared requirement.
    fn declarations(&self) -> Vec<RouteDeclaration>;
}

/// Route catalog backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticRouteCatalog {
    declarations: Vec<RouteDeclaration>,
}

impl StaticRouteCatalog {
    /// Creates a catalog from explicit declarations.
    #[must_use]
    pub fn new(declarations: Vec<RouteDeclaration>) -> Self {
        Self { declarations }
    }

    /// Finds the declaration for a method and route template.
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<&RouteDeclaration> {
        self.declarations
            .iter()
            .find(|declaration| declaration.matches(method, path))
    }
}

impl RouteCatalog for StaticRouteCatalog {
    fn declarations(&self) -> Vec<RouteDeclaration> {
        self.declarations.clone()
    }
}
