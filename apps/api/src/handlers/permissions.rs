use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use permbit_application::CreatePermissionInput;

use crate::dto::{
    CategoryCodesResponse, CreatePermissionRequest, DiscoveredPermissionResponse,
    ListPermissionsQuery, PermissionCategoryResponse, PermissionResponse, PermissionSyncResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Query(query): Query<ListPermissionsQuery>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .role_admin_service
        .list_permissions(query.include_deprecated)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .role_admin_service
        .create_permission(CreatePermissionInput {
            code: payload.code,
            name: payload.name,
            description: payload.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(permission))))
}

pub async fn list_permission_categories_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PermissionCategoryResponse>>> {
    let categories = state
        .role_admin_service
        .list_categories()
        .await?
        .into_iter()
        .map(PermissionCategoryResponse::from)
        .collect();

    Ok(Json(categories))
}

pub async fn list_category_codes_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<CategoryCodesResponse>> {
    let codes = state
        .permission_cache_service
        .get_category_codes(category.as_str())
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(CategoryCodesResponse { category, codes }))
}

pub async fn discover_permissions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DiscoveredPermissionResponse>>> {
    let discovered = state
        .permission_discovery_service
        .discover_permissions()
        .await?
        .into_iter()
        .map(DiscoveredPermissionResponse::from)
        .collect();

    Ok(Json(discovered))
}

pub async fn sync_permissions_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<PermissionSyncResponse>> {
    let report = state.permission_discovery_service.sync_permissions().await?;
    Ok(Json(PermissionSyncResponse::from(report)))
}
