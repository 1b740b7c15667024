use std::sync::Arc;

use crate::application::repos::CatalogRepo;
use crate::domain::entities::MenuTree;

use super::CatalogError;

/// Whole-tree reads. Never cached: the tree spans every key family at once.
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>) -> Self {
        Self { repo }
    }

    pub async fn tree(&self) -> Result<Vec<MenuTree>, CatalogError> {
        self.repo.load_catalog().await.map_err(CatalogError::from)
    }

    pub async fn health(&self) -> Result<(), CatalogError> {
        self.repo.health_check().await.map_err(CatalogError::from)
    }
}
