use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use permbit_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::{issue_identity, store_identity};

pub async fn me_handler(
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    Ok(Json(UserIdentityResponse::from(identity)))
}

/// Recomputes the session permission snapshot, picking up role changes made
/// since login.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let refreshed = issue_identity(
        &state,
        identity.person_id(),
        identity.display_name().to_owned(),
    )
    .await?;
    store_identity(&session, &refreshed).await?;

    Ok(Json(UserIdentityResponse::from(refreshed)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}
