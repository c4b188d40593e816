use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use permbit_core::PersonId;

use crate::dto::{EffectivePermissionsResponse, HasPermissionResponse, PersonRoleResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_person_roles_handler(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> ApiResult<Json<Vec<PersonRoleResponse>>> {
    let person_id = PersonId::from_str(person_id.as_str())?;
    let roles = state
        .role_admin_service
        .list_person_roles(person_id)
        .await?
        .into_iter()
        .map(PersonRoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn assign_person_role_handler(
    State(state): State<AppState>,
    Path((person_id, role_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let person_id = PersonId::from_str(person_id.as_str())?;
    state
        .role_admin_service
        .assign_role_to_person(person_id, role_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_person_role_handler(
    State(state): State<AppState>,
    Path((person_id, role_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let person_id = PersonId::from_str(person_id.as_str())?;
    state
        .role_admin_service
        .remove_role_from_person(person_id, role_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn effective_permissions_handler(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let person_id = PersonId::from_str(person_id.as_str())?;
    let effective = state
        .effective_permission_service
        .calculate_effective_permissions(person_id)
        .await?;

    Ok(Json(EffectivePermissionsResponse {
        person_id: person_id.to_string(),
        bitfield: effective.to_decimal(),
    }))
}

pub async fn has_permission_handler(
    State(state): State<AppState>,
    Path((person_id, code)): Path<(String, String)>,
) -> ApiResult<Json<HasPermissionResponse>> {
    let person_id = PersonId::from_str(person_id.as_str())?;
    let granted = state
        .effective_permission_service
        .has_permission(person_id, code.as_str())
        .await?;

    Ok(Json(HasPermissionResponse {
        person_id: person_id.to_string(),
        code,
        granted,
    }))
}
