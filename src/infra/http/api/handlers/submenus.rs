//! Submenu handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CreateSubmenuCommand, UpdateSubmenuCommand};

use super::{WindowQuery, catalog_to_api, json_body};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_submenus(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let submenus = state
        .submenus
        .list(&menu_id, query.window())
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenus))
}

pub async fn get_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let submenu = state
        .submenus
        .get(&menu_id, &submenu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenu))
}

pub async fn create_submenu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
    payload: Result<Json<SubmenuCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = CreateSubmenuCommand {
        menu_id,
        title: payload.title,
        description: payload.description,
    };

    let submenu = state
        .submenus
        .create(command)
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(submenu)))
}

pub async fn update_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
    payload: Result<Json<SubmenuUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = UpdateSubmenuCommand {
        menu_id,
        submenu_id,
        title: payload.title,
        description: payload.description,
    };

    let submenu = state
        .submenus
        .update(command)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenu))
}

pub async fn delete_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .submenus
        .delete(&menu_id, &submenu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(DeletedResponse::new("Submenu deleted", deleted)))
}

pub async fn delete_all_submenus(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .submenus
        .delete_all(&menu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(DeletedResponse::new("All submenus deleted", deleted)))
}
