use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::catalog_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn get_catalog(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let tree = state.catalog.tree().await.map_err(catalog_to_api)?;
    Ok(Json(tree))
}
