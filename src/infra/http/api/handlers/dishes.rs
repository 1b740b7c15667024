//! Dish handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CreateDishCommand, UpdateDishCommand};

use super::{WindowQuery, catalog_to_api, json_body};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_dishes(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let dishes = state
        .dishes
        .list(&menu_id, &submenu_id, query.window())
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dishes))
}

pub async fn get_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let dish = state
        .dishes
        .get(&menu_id, &submenu_id, &dish_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dish))
}

pub async fn create_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
    payload: Result<Json<DishCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = CreateDishCommand {
        menu_id,
        submenu_id,
        title: payload.title,
        description: payload.description,
        price: payload.price,
    };

    let dish = state
        .dishes
        .create(command)
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn update_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(String, String, String)>,
    payload: Result<Json<DishUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = UpdateDishCommand {
        menu_id,
        submenu_id,
        dish_id,
        title: payload.title,
        description: payload.description,
        price: payload.price,
    };

    let dish = state
        .dishes
        .update(command)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dish))
}

pub async fn delete_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .dishes
        .delete(&menu_id, &submenu_id, &dish_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(DeletedResponse::new("Dish deleted", deleted)))
}

pub async fn delete_all_dishes(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .dishes
        .delete_all(&menu_id, &submenu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(DeletedResponse::new("All dishes deleted", deleted)))
}
