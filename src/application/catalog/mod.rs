//! Catalog services backing the REST surface.
//!
//! Reads consult the cache first; writes go to the store and then drop the keys the
//! invalidation policy assigns to each committed mutation.

mod dishes;
mod menus;
mod submenus;
mod tree;

pub use dishes::{CreateDishCommand, DishService, UpdateDishCommand};
pub use menus::{CreateMenuCommand, MenuService, UpdateMenuCommand};
pub use submenus::{CreateSubmenuCommand, SubmenuService, UpdateSubmenuCommand};
pub use tree::CatalogService;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::application::repos::RepoError;
use crate::cache::{CacheClient, Invalidations, Mutation};
use crate::domain::error::DomainError;
use crate::domain::types::EntityPath;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub(crate) fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::ConstraintViolation(field));
    }
    Ok(())
}

pub(crate) fn ensure_patch_field(
    value: Option<&String>,
    field: &'static str,
) -> Result<(), CatalogError> {
    match value {
        Some(value) => ensure_non_empty(value, field),
        None => Ok(()),
    }
}

pub(crate) fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Drop every key made stale by `mutations`. Call only after the store committed.
pub(crate) async fn invalidate_after_commit(cache: &CacheClient, mutations: &[Mutation]) {
    let mut invalidations = Invalidations::new();
    invalidations.record_all(mutations);
    let deleted = cache.invalidate(invalidations.keys()).await;
    debug!(
        target = "menuboard::catalog",
        mutations = mutations.len(),
        keys = invalidations.len(),
        deleted,
        "Invalidated cache keys"
    );
}

pub(crate) fn deletions(paths: Vec<EntityPath>) -> Vec<Mutation> {
    paths.into_iter().map(Mutation::deleted).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCounts {
    pub menus: u64,
    pub submenus: u64,
    pub dishes: u64,
}

impl DeletedCounts {
    pub(crate) fn tally(paths: &[EntityPath]) -> Self {
        let mut counts = Self::default();
        for path in paths {
            match path {
                EntityPath::Menu { .. } => counts.menus += 1,
                EntityPath::Submenu { .. } => counts.submenus += 1,
                EntityPath::Dish { .. } => counts.dishes += 1,
            }
        }
        counts
    }
}
