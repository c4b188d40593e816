use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use permbit_core::AppError;
use tower_sessions::Session;
use tracing::error;

use crate::auth::current_identity;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = current_identity(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Checks the matched route against its declared permission requirement.
///
/// A guarded route missing from the declaration table fails closed.
pub async fn enforce_route_permissions(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(matched_path) = request.extensions().get::<MatchedPath>().cloned() else {
        return Err(AppError::Internal("guarded request has no matched route".to_owned()).into());
    };

    let method = request.method().as_str().to_owned();
    let Some(declaration) = state.route_catalog.find(&method, matched_path.as_str()) else {
        error!(
            method,
            path = matched_path.as_str(),
            "guarded route has no permission declaration"
        );
        return Err(AppError::Internal("route permissions are not declared".to_owned()).into());
    };

    let identity = current_identity(&session).await?;
    state
        .permission_guard
        .authorize(declaration, identity.as_ref())
        .await?;

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    Ok(next.run(request).await)
}
