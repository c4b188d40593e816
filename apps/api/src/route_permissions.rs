use permbit_application::StaticRouteCatalog;
use permbit_domain::RouteDeclaration;

/// Permission requirements of every guarded route, keyed by method and the
/// path template registered with the router.
///
/// The guard middleware resolves requests through this table and discovery
/// reads it to keep the registry in step.
const ROUTE_PERMISSIONS: &[(&str, &str, &str, &[&str])] = &[
    (
        "list_permissions_handler",
        "GET",
        "/api/permissions",
        &["permissions.read"],
    ),
    (
        "create_permission_handler",
        "POST",
        "/api/permissions",
        &["permissions.create"],
    ),
    (
        "list_permission_categories_handler",
        "GET",
        "/api/permissions/categories",
        &["permissions.read"],
    ),
    (
        "list_category_codes_handler",
        "GET",
        "/api/permissions/categories/{category}",
        &["permissions.read"],
    ),
    (
        "discover_permissions_handler",
        "GET",
        "/api/permissions/discovered",
        &["permissions.sync"],
    ),
    (
        "sync_permissions_handler",
        "POST",
        "/api/permissions/sync",
        &["permissions.sync"],
    ),
    ("list_roles_handler", "GET", "/api/roles", &["roles.read"]),
    ("create_role_handler", "POST", "/api/roles", &["roles.create"]),
    ("get_role_handler", "GET", "/api/roles/{role_id}", &["roles.read"]),
    (
        "update_role_handler",
        "PUT",
        "/api/roles/{role_id}",
        &["roles.update"],
    ),
    (
        "delete_role_handler",
        "DELETE",
        "/api/roles/{role_id}",
        &["roles.delete"],
    ),
    (
        "toggle_role_permission_handler",
        "POST",
        "/api/roles/{role_id}/permissions/{code}/toggle",
        &["roles.update", "permissions.assign"],
    ),
    (
        "reorder_role_handler",
        "PUT",
        "/api/roles/{role_id}/position",
        &["roles.update"],
    ),
    (
        "list_person_roles_handler",
        "GET",
        "/api/persons/{person_id}/roles",
        &["persons.read"],
    ),
    (
        "assign_person_role_handler",
        "POST",
        "/api/persons/{person_id}/roles/{role_id}",
        &["persons.assign_roles"],
    ),
    (
        "remove_person_role_handler",
        "DELETE",
        "/api/persons/{person_id}/roles/{role_id}",
        &["persons.assign_roles"],
    ),
    (
        "effective_permissions_handler",
        "GET",
        "/api/persons/{person_id}/permissions",
        &["persons.read"],
    ),
    (
        "has_permission_handler",
        "GET",
        "/api/persons/{person_id}/permissions/{code}",
        &["persons.read"],
    ),
    (
        "dashboard_stats_handler",
        "GET",
        "/api/dashboard/stats",
        &["dashboard.read"],
    ),
];

pub fn route_permission_catalog() -> StaticRouteCatalog {
    StaticRouteCatalog::new(
        ROUTE_PERMISSIONS
            .iter()
            .map(|(handler, method, path, codes)| {
                RouteDeclaration::new(*handler, *method, *path, codes)
            })
            .collect(),
    )
}
