//! API handlers organized by resource level.
//!
//! Each submodule holds the handlers for one level of the catalog. Query structs and
//! error conversions are shared from here.

mod catalog;
mod dishes;
mod menus;
mod submenus;

pub use catalog::*;
pub use dishes::*;
pub use menus::*;
pub use submenus::*;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::application::catalog::CatalogError;
use crate::application::pagination::PageWindow;
use crate::application::repos::RepoError;

use super::error::{ApiError, codes};

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl WindowQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::from_query(self.skip, self.limit)
    }
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(ApiError::bad_request(
            "Malformed request body",
            Some(rejection.body_text()),
        )),
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::NotFound(entity) => ApiError::not_found(not_found_message(entity)),
        CatalogError::ConstraintViolation(field) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid field",
            Some(field.to_string()),
        ),
        CatalogError::Domain(domain) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Request could not be processed",
            Some(domain.to_string()),
        ),
        CatalogError::Repo(repo) => repo_to_api(repo),
    }
}

fn not_found_message(entity: &str) -> &'static str {
    match entity {
        "menu" => "menu not found",
        "submenu" => "submenu not found",
        "dish" => "dish not found",
        _ => "resource not found",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn not_found_keeps_entity_in_message() {
        let err = catalog_to_api(CatalogError::NotFound("submenu"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), codes::NOT_FOUND);
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        let constraint = catalog_to_api(CatalogError::ConstraintViolation("title"));
        assert_eq!(constraint.status(), StatusCode::BAD_REQUEST);

        let domain = catalog_to_api(CatalogError::Domain(DomainError::validation("bad price")));
        assert_eq!(domain.status(), StatusCode::BAD_REQUEST);
        assert_eq!(domain.code(), codes::INVALID_INPUT);
    }

    #[test]
    fn repo_failures_map_by_kind() {
        let duplicate = repo_to_api(RepoError::Duplicate {
            constraint: "menus_pkey".to_string(),
        });
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
        assert_eq!(
            repo_to_api(RepoError::Timeout).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            catalog_to_api(CatalogError::Repo(RepoError::from_persistence("boom"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn window_query_defaults_to_first_hundred() {
        let window = WindowQuery::default().window();
        assert!(window.is_default());

        let custom = WindowQuery {
            skip: Some(5),
            limit: Some(10),
        }
        .window();
        assert_eq!(custom, PageWindow::new(5, 10));
    }
}
