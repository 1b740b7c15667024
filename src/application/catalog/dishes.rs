use std::sync::Arc;

use crate::application::pagination::PageWindow;
use crate::application::repos::{DishPatch, DishesRepo, DishesWriteRepo, SubmenusRepo};
use crate::cache::{CacheClient, CacheKey, Mutation};
use crate::domain::entities::DishRecord;
use crate::domain::pricing::parse_price;
use crate::domain::types::EntityPath;

use super::{
    CatalogError, DeletedCounts, deletions, ensure_non_empty, ensure_patch_field,
    invalidate_after_commit, new_entity_id,
};

#[derive(Debug, Clone)]
pub struct CreateDishCommand {
    pub menu_id: String,
    pub submenu_id: String,
    pub title: String,
    pub description: String,
    pub price: String,
}

#[derive(Debug, Clone)]
pub struct UpdateDishCommand {
    pub menu_id: String,
    pub submenu_id: String,
    pub dish_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

#[derive(Clone)]
pub struct DishService {
    submenus: Arc<dyn SubmenusRepo>,
    reader: Arc<dyn DishesRepo>,
    writer: Arc<dyn DishesWriteRepo>,
    cache: CacheClient,
}

fn validated_price(raw: &str) -> Result<String, CatalogError> {
    parse_price(raw).map_err(|_| CatalogError::ConstraintViolation("price"))?;
    Ok(raw.trim().to_string())
}

impl DishService {
    pub fn new(
        submenus: Arc<dyn SubmenusRepo>,
        reader: Arc<dyn DishesRepo>,
        writer: Arc<dyn DishesWriteRepo>,
        cache: CacheClient,
    ) -> Self {
        Self {
            submenus,
            reader,
            writer,
            cache,
        }
    }

    /// The submenu must exist and belong to `menu_id`.
    async fn ensure_submenu(&self, menu_id: &str, submenu_id: &str) -> Result<(), CatalogError> {
        match self.submenus.find_submenu(menu_id, submenu_id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::NotFound("submenu")),
        }
    }

    pub async fn list(
        &self,
        menu_id: &str,
        submenu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<DishRecord>, CatalogError> {
        let key = window
            .is_default()
            .then(|| CacheKey::dishes(menu_id, submenu_id, window));
        let mut seen = None;
        if let Some(key) = key.as_ref() {
            if let Some(cached) = self.cache.get_json::<Vec<DishRecord>>(key).await {
                return Ok(cached);
            }
            seen = Some(self.cache.generation(key).await);
        }

        self.ensure_submenu(menu_id, submenu_id).await?;
        let dishes = self.reader.list_dishes(menu_id, submenu_id, window).await?;
        if let (Some(key), Some(seen)) = (key.as_ref(), seen) {
            self.cache.fill_json(key, &dishes, seen).await;
        }
        Ok(dishes)
    }

    pub async fn get(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<DishRecord, CatalogError> {
        let key = CacheKey::dish(menu_id, submenu_id, dish_id);
        if let Some(cached) = self.cache.get_json::<DishRecord>(&key).await {
            return Ok(cached);
        }
        let seen = self.cache.generation(&key).await;

        let dish = self
            .reader
            .find_dish(menu_id, submenu_id, dish_id)
            .await?
            .ok_or(CatalogError::NotFound("dish"))?;
        self.cache.fill_json(&key, &dish, seen).await;
        Ok(dish)
    }

    pub async fn create(&self, command: CreateDishCommand) -> Result<DishRecord, CatalogError> {
        ensure_non_empty(&command.title, "title")?;
        let price = validated_price(&command.price)?;
        self.ensure_submenu(&command.menu_id, &command.submenu_id)
            .await?;

        let record = DishRecord {
            id: new_entity_id(),
            submenu_id: command.submenu_id,
            title: command.title.trim().to_string(),
            description: command.description,
            price,
        };
        let dish = self.writer.create_dish(record).await?;

        invalidate_after_commit(
            &self.cache,
            &[Mutation::created(EntityPath::dish(
                &command.menu_id,
                &dish.submenu_id,
                &dish.id,
            ))],
        )
        .await;
        Ok(dish)
    }

    pub async fn update(&self, command: UpdateDishCommand) -> Result<DishRecord, CatalogError> {
        ensure_patch_field(command.title.as_ref(), "title")?;
        let price = command
            .price
            .as_deref()
            .map(validated_price)
            .transpose()?;

        let patch = DishPatch {
            title: command.title.map(|title| title.trim().to_string()),
            description: command.description,
            price,
        };
        let dish = self
            .writer
            .update_dish(
                &command.menu_id,
                &command.submenu_id,
                &command.dish_id,
                patch,
            )
            .await?
            .ok_or(CatalogError::NotFound("dish"))?;

        invalidate_after_commit(
            &self.cache,
            &[Mutation::updated(EntityPath::dish(
                &command.menu_id,
                &dish.submenu_id,
                &dish.id,
            ))],
        )
        .await;
        Ok(dish)
    }

    pub async fn delete(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<DeletedCounts, CatalogError> {
        let removed = self
            .writer
            .delete_dish(menu_id, submenu_id, dish_id)
            .await?;
        if removed.is_empty() {
            return Err(CatalogError::NotFound("dish"));
        }

        let counts = DeletedCounts::tally(&removed);
        invalidate_after_commit(&self.cache, &deletions(removed)).await;
        Ok(counts)
    }

    pub async fn delete_all(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<DeletedCounts, CatalogError> {
        self.ensure_submenu(menu_id, submenu_id).await?;

        let removed = self.writer.delete_all_dishes(menu_id, submenu_id).await?;
        let counts = DeletedCounts::tally(&removed);
        invalidate_after_commit(&self.cache, &deletions(removed)).await;
        Ok(counts)
    }
}
