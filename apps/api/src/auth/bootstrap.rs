use std::str::FromStr;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use permbit_core::{AppError, PersonId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, issue_identity, store_identity};

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub person_id: String,
    pub token: String,
    pub display_name: Option<String>,
}

pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        warn!("bootstrap login rejected");
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let person_id = PersonId::from_str(payload.person_id.as_str())?;
    let display_name = payload
        .display_name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| person_id.to_string());
    let identity = issue_identity(&state, person_id, display_name).await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    store_identity(&session, &identity).await?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(
        person_id = %person_id,
        is_super_admin = identity.permissions().is_super_admin,
        "session bootstrapped"
    );

    Ok(StatusCode::NO_CONTENT)
}
