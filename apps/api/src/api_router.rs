use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{MethodRouter, get, post, put};
use permbit_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

/// Admin routes behind the permission guard, keyed by the path template the
/// route table declares them under.
pub fn guarded_routes() -> Vec<(&'static str, MethodRouter<AppState>)> {
    vec![
        (
            "/api/permissions",
            get(handlers::permissions::list_permissions_handler)
                .post(handlers::permissions::create_permission_handler),
        ),
        (
            "/api/permissions/categories",
            get(handlers::permissions::list_permission_categories_handler),
        ),
        (
            "/api/permissions/categories/{category}",
            get(handlers::permissions::list_category_codes_handler),
        ),
        (
            "/api/permissions/discovered",
            get(handlers::permissions::discover_permissions_handler),
        ),
        (
            "/api/permissions/sync",
            post(handlers::permissions::sync_permissions_handler),
        ),
        (
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        ),
        (
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .put(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        ),
        (
            "/api/roles/{role_id}/permissions/{code}/toggle",
            post(handlers::roles::toggle_role_permission_handler),
        ),
        (
            "/api/roles/{role_id}/position",
            put(handlers::roles::reorder_role_handler),
        ),
        (
            "/api/persons/{person_id}/roles",
            get(handlers::persons::list_person_roles_handler),
        ),
        (
            "/api/persons/{person_id}/roles/{role_id}",
            post(handlers::persons::assign_person_role_handler)
                .delete(handlers::persons::remove_person_role_handler),
        ),
        (
            "/api/persons/{person_id}/permissions",
            get(handlers::persons::effective_permissions_handler),
        ),
        (
            "/api/persons/{person_id}/permissions/{code}",
            get(handlers::persons::has_permission_handler),
        ),
        (
            "/api/dashboard/stats",
            get(handlers::dashboard::dashboard_stats_handler),
        ),
    ]
}

pub fn build_router<Store>(
    app_state: AppState,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let guarded_routes = guarded_routes()
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(path, method_router)
        })
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::enforce_route_permissions,
        ));

    let session_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(app_state.frontend_url.as_str())
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(session_routes)
        .merge(guarded_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
