use std::sync::Arc;

use crate::application::pagination::PageWindow;
use crate::application::repos::{MenusRepo, SubmenusRepo, SubmenusWriteRepo, TitlePatch};
use crate::cache::{CacheClient, CacheKey, Mutation};
use crate::domain::entities::{SubmenuRecord, SubmenuSummary};
use crate::domain::types::EntityPath;

use super::{
    CatalogError, DeletedCounts, deletions, ensure_non_empty, ensure_patch_field,
    invalidate_after_commit, new_entity_id,
};

#[derive(Debug, Clone)]
pub struct CreateSubmenuCommand {
    pub menu_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdateSubmenuCommand {
    pub menu_id: String,
    pub submenu_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct SubmenuService {
    menus: Arc<dyn MenusRepo>,
    reader: Arc<dyn SubmenusRepo>,
    writer: Arc<dyn SubmenusWriteRepo>,
    cache: CacheClient,
}

impl SubmenuService {
    pub fn new(
        menus: Arc<dyn MenusRepo>,
        reader: Arc<dyn SubmenusRepo>,
        writer: Arc<dyn SubmenusWriteRepo>,
        cache: CacheClient,
    ) -> Self {
        Self {
            menus,
            reader,
            writer,
            cache,
        }
    }

    async fn ensure_menu(&self, menu_id: &str) -> Result<(), CatalogError> {
        match self.menus.find_menu(menu_id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::NotFound("menu")),
        }
    }

    pub async fn list(
        &self,
        menu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<SubmenuSummary>, CatalogError> {
        let key = window
            .is_default()
            .then(|| CacheKey::submenus(menu_id, window));
        let mut seen = None;
        if let Some(key) = key.as_ref() {
            if let Some(cached) = self.cache.get_json::<Vec<SubmenuSummary>>(key).await {
                return Ok(cached);
            }
            seen = Some(self.cache.generation(key).await);
        }

        self.ensure_menu(menu_id).await?;
        let submenus = self.reader.list_submenus(menu_id, window).await?;
        if let (Some(key), Some(seen)) = (key.as_ref(), seen) {
            self.cache.fill_json(key, &submenus, seen).await;
        }
        Ok(submenus)
    }

    pub async fn get(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<SubmenuSummary, CatalogError> {
        let key = CacheKey::submenu(menu_id, submenu_id);
        if let Some(cached) = self.cache.get_json::<SubmenuSummary>(&key).await {
            return Ok(cached);
        }
        let seen = self.cache.generation(&key).await;

        let submenu = self
            .reader
            .find_submenu(menu_id, submenu_id)
            .await?
            .ok_or(CatalogError::NotFound("submenu"))?;
        self.cache.fill_json(&key, &submenu, seen).await;
        Ok(submenu)
    }

    pub async fn create(
        &self,
        command: CreateSubmenuCommand,
    ) -> Result<SubmenuSummary, CatalogError> {
        ensure_non_empty(&command.title, "title")?;
        self.ensure_menu(&command.menu_id).await?;

        let record = SubmenuRecord {
            id: new_entity_id(),
            menu_id: command.menu_id,
            title: command.title.trim().to_string(),
            description: command.description,
        };
        let submenu = self.writer.create_submenu(record).await?;

        invalidate_after_commit(
            &self.cache,
            &[Mutation::created(EntityPath::submenu(
                &submenu.menu_id,
                &submenu.id,
            ))],
        )
        .await;
        Ok(submenu)
    }

    pub async fn update(
        &self,
        command: UpdateSubmenuCommand,
    ) -> Result<SubmenuSummary, CatalogError> {
        ensure_patch_field(command.title.as_ref(), "title")?;

        let patch = TitlePatch {
            title: command.title.map(|title| title.trim().to_string()),
            description: command.description,
        };
        let submenu = self
            .writer
            .update_submenu(&command.menu_id, &command.submenu_id, patch)
            .await?
            .ok_or(CatalogError::NotFound("submenu"))?;

        invalidate_after_commit(
            &self.cache,
            &[Mutation::updated(EntityPath::submenu(
                &submenu.menu_id,
                &submenu.id,
            ))],
        )
        .await;
        Ok(submenu)
    }

    pub async fn delete(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<DeletedCounts, CatalogError> {
        let removed = self.writer.delete_submenu(menu_id, submenu_id).await?;
        if removed.is_empty() {
            return Err(CatalogError::NotFound("submenu"));
        }

        let counts = DeletedCounts::tally(&removed);
        invalidate_after_commit(&self.cache, &deletions(removed)).await;
        Ok(counts)
    }

    pub async fn delete_all(&self, menu_id: &str) -> Result<DeletedCounts, CatalogError> {
        self.ensure_menu(menu_id).await?;

        let removed = self.writer.delete_all_submenus(menu_id).await?;
        let counts = DeletedCounts::tally(&removed);
        invalidate_after_commit(&self.cache, &deletions(removed)).await;
        Ok(counts)
    }
}
