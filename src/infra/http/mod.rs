pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::get,
};

use crate::application::error::AppError;
use crate::infra::error::InfraError;
use middleware::{log_responses, set_request_context};

/// Full HTTP surface: the versioned API plus the health probe.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .with_state(state.clone())
        .merge(build_api_router(state))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn healthz(State(state): State<ApiState>) -> Result<StatusCode, AppError> {
    state
        .catalog
        .health()
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
