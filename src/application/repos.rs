use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageWindow;
use crate::domain::entities::{
    DishRecord, MenuRecord, MenuSummary, MenuTree, SubmenuRecord, SubmenuSummary,
};
use crate::domain::types::EntityPath;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Partial update for menus and submenus; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TitlePatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DishPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

#[async_trait]
pub trait MenusRepo: Send + Sync {
    async fn list_menus(&self, window: PageWindow) -> Result<Vec<MenuSummary>, RepoError>;

    async fn find_menu(&self, menu_id: &str) -> Result<Option<MenuSummary>, RepoError>;
}

/// Deletes return the path of every removed entity, cascaded children included.
/// An empty vector means nothing matched.
#[async_trait]
pub trait MenusWriteRepo: Send + Sync {
    async fn create_menu(&self, record: MenuRecord) -> Result<MenuSummary, RepoError>;

    async fn update_menu(
        &self,
        menu_id: &str,
        patch: TitlePatch,
    ) -> Result<Option<MenuSummary>, RepoError>;

    async fn delete_menu(&self, menu_id: &str) -> Result<Vec<EntityPath>, RepoError>;

    async fn delete_all_menus(&self) -> Result<Vec<EntityPath>, RepoError>;
}

#[async_trait]
pub trait SubmenusRepo: Send + Sync {
    async fn list_submenus(
        &self,
        menu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<SubmenuSummary>, RepoError>;

    async fn find_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Option<SubmenuSummary>, RepoError>;
}

#[async_trait]
pub trait SubmenusWriteRepo: Send + Sync {
    async fn create_submenu(&self, record: SubmenuRecord) -> Result<SubmenuSummary, RepoError>;

    async fn update_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
        patch: TitlePatch,
    ) -> Result<Option<SubmenuSummary>, RepoError>;

    async fn delete_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError>;

    async fn delete_all_submenus(&self, menu_id: &str) -> Result<Vec<EntityPath>, RepoError>;
}

#[async_trait]
pub trait DishesRepo: Send + Sync {
    async fn list_dishes(
        &self,
        menu_id: &str,
        submenu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<DishRecord>, RepoError>;

    async fn find_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<Option<DishRecord>, RepoError>;
}

#[async_trait]
pub trait DishesWriteRepo: Send + Sync {
    async fn create_dish(&self, record: DishRecord) -> Result<DishRecord, RepoError>;

    async fn update_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
        patch: DishPatch,
    ) -> Result<Option<DishRecord>, RepoError>;

    async fn delete_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError>;

    async fn delete_all_dishes(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError>;
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Entire tree in insertion order at every level.
    async fn load_catalog(&self) -> Result<Vec<MenuTree>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}

/// Opens transactions spanning any number of catalog mutations.
#[async_trait]
pub trait CatalogUnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>, RepoError>;
}

/// Mutations become visible only on [`CatalogTransaction::commit`]; dropping the
/// transaction rolls everything back. Deletes cascade to children in storage.
#[async_trait]
pub trait CatalogTransaction: Send {
    async fn menus(&mut self) -> Result<Vec<MenuRecord>, RepoError>;

    async fn submenus_of(&mut self, menu_id: &str) -> Result<Vec<SubmenuRecord>, RepoError>;

    async fn dishes_of(&mut self, submenu_id: &str) -> Result<Vec<DishRecord>, RepoError>;

    async fn insert_menu(&mut self, record: &MenuRecord) -> Result<(), RepoError>;

    async fn update_menu(&mut self, record: &MenuRecord) -> Result<(), RepoError>;

    async fn delete_menu(&mut self, menu_id: &str) -> Result<(), RepoError>;

    async fn insert_submenu(&mut self, record: &SubmenuRecord) -> Result<(), RepoError>;

    async fn update_submenu(&mut self, record: &SubmenuRecord) -> Result<(), RepoError>;

    async fn delete_submenu(&mut self, submenu_id: &str) -> Result<(), RepoError>;

    async fn insert_dish(&mut self, record: &DishRecord) -> Result<(), RepoError>;

    async fn update_dish(&mut self, record: &DishRecord) -> Result<(), RepoError>;

    async fn delete_dish(&mut self, dish_id: &str) -> Result<(), RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}
