use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use permbit_application::{CreateRoleInput, UpdateRoleInput};
use permbit_domain::PermissionCode;

use crate::dto::{
    CreateRoleRequest, ReorderRoleRequest, RolePermissionToggleResponse, RoleResponse,
    UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_admin_service
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.role_admin_service.get_role(role_id.as_str()).await?;
    Ok(Json(RoleResponse::from(role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let permissions = payload
        .permissions
        .iter()
        .map(|code| PermissionCode::new(code.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    let role = state
        .role_admin_service
        .create_role(CreateRoleInput {
            name: payload.name,
            description: payload.description,
            permissions,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_admin_service
        .update_role(
            role_id.as_str(),
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.role_admin_service.delete_role(role_id.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_role_permission_handler(
    State(state): State<AppState>,
    Path((role_id, code)): Path<(String, String)>,
) -> ApiResult<Json<RolePermissionToggleResponse>> {
    let code = PermissionCode::new(code)?;
    let toggle = state
        .role_admin_service
        .toggle_role_permission(role_id.as_str(), &code)
        .await?;

    Ok(Json(RolePermissionToggleResponse::new(code, toggle)))
}

pub async fn reorder_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Json(payload): Json<ReorderRoleRequest>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_admin_service
        .reorder_role(role_id.as_str(), payload.position)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}
