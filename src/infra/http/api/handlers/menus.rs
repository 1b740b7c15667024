//! Menu handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CreateMenuCommand, UpdateMenuCommand};

use super::{WindowQuery, catalog_to_api, json_body};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_menus(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let menus = state
        .menus
        .list(query.window())
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(menus))
}

pub async fn get_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let menu = state.menus.get(&menu_id).await.map_err(catalog_to_api)?;
    Ok(Json(menu))
}

pub async fn create_menu(
    State(state): State<ApiState>,
    payload: Result<Json<MenuCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = CreateMenuCommand {
        title: payload.title,
        description: payload.description,
    };

    let menu = state.menus.create(command).await.map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn update_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
    payload: Result<Json<MenuUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = UpdateMenuCommand {
        menu_id,
        title: payload.title,
        description: payload.description,
    };

    let menu = state.menus.update(command).await.map_err(catalog_to_api)?;
    Ok(Json(menu))
}

pub async fn delete_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.menus.delete(&menu_id).await.map_err(catalog_to_api)?;
    Ok(Json(DeletedResponse::new("Menu deleted", deleted)))
}

pub async fn delete_all_menus(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.menus.delete_all().await.map_err(catalog_to_api)?;
    Ok(Json(DeletedResponse::new("All menus deleted", deleted)))
}
