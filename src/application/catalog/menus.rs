use std::sync::Arc;

use crate::application::pagination::PageWindow;
use crate::application::repos::{MenusRepo, MenusWriteRepo, TitlePatch};
use crate::cache::{CacheClient, CacheKey, Mutation};
use crate::domain::entities::{MenuRecord, MenuSummary};
use crate::domain::types::EntityPath;

use super::{
    CatalogError, DeletedCounts, deletions, ensure_non_empty, ensure_patch_field,
    invalidate_after_commit, new_entity_id,
};

#[derive(Debug, Clone)]
pub struct CreateMenuCommand {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdateMenuCommand {
    pub menu_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct MenuService {
    reader: Arc<dyn MenusRepo>,
    writer: Arc<dyn MenusWriteRepo>,
    cache: CacheClient,
}

impl MenuService {
    pub fn new(
        reader: Arc<dyn MenusRepo>,
        writer: Arc<dyn MenusWriteRepo>,
        cache: CacheClient,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    pub async fn list(&self, window: PageWindow) -> Result<Vec<MenuSummary>, CatalogError> {
        let key = window.is_default().then(|| CacheKey::menus(window));
        let mut seen = None;
        if let Some(key) = key.as_ref() {
            if let Some(cached) = self.cache.get_json::<Vec<MenuSummary>>(key).await {
                return Ok(cached);
            }
            seen = Some(self.cache.generation(key).await);
        }

        let menus = self.reader.list_menus(window).await?;
        if let (Some(key), Some(seen)) = (key.as_ref(), seen) {
            self.cache.fill_json(key, &menus, seen).await;
        }
        Ok(menus)
    }

    pub async fn get(&self, menu_id: &str) -> Result<MenuSummary, CatalogError> {
        let key = CacheKey::menu(menu_id);
        if let Some(cached) = self.cache.get_json::<MenuSummary>(&key).await {
            return Ok(cached);
        }
        let seen = self.cache.generation(&key).await;

        let menu = self
            .reader
            .find_menu(menu_id)
            .await?
            .ok_or(CatalogError::NotFound("menu"))?;
        self.cache.fill_json(&key, &menu, seen).await;
        Ok(menu)
    }

    pub async fn create(&self, command: CreateMenuCommand) -> Result<MenuSummary, CatalogError> {
        ensure_non_empty(&command.title, "title")?;

        let record = MenuRecord {
            id: new_entity_id(),
            title: command.title.trim().to_string(),
            description: command.description,
        };
        let menu = self.writer.create_menu(record).await?;

        invalidate_after_commit(
            &self.cache,
            &[Mutation::created(EntityPath::menu(&menu.id))],
        )
        .await;
        Ok(menu)
    }

    pub async fn update(&self, command: UpdateMenuCommand) -> Result<MenuSummary, CatalogError> {
        ensure_patch_field(command.title.as_ref(), "title")?;

        let patch = TitlePatch {
            title: command.title.map(|title| title.trim().to_string()),
            description: command.description,
        };
        let menu = self
            .writer
            .update_menu(&command.menu_id, patch)
            .await?
            .ok_or(CatalogError::NotFound("menu"))?;

        invalidate_after_commit(
            &self.cache,
            &[Mutation::updated(EntityPath::menu(&menu.id))],
        )
        .await;
        Ok(menu)
    }

    pub async fn delete(&self, menu_id: &str) -> Result<DeletedCounts, CatalogError> {
        let removed = self.writer.delete_menu(menu_id).await?;
        if removed.is_empty() {
            return Err(CatalogError::NotFound("menu"));
        }

        let counts = DeletedCounts::tally(&removed);
        invalidate_after_commit(&self.cache, &deletions(removed)).await;
        Ok(counts)
    }

    pub async fn delete_all(&self) -> Result<DeletedCounts, CatalogError> {
        let removed = self.writer.delete_all_menus().await?;
        let counts = DeletedCounts::tally(&removed);
        invalidate_after_commit(&self.cache, &deletions(removed)).await;
        Ok(counts)
    }
}
