//! In-process catalog store, used when no database URL is configured and by tests.
//!
//! Transactions take the store lock for their whole lifetime and mutate a private copy
//! of the state, which replaces the shared state only on commit.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::pagination::PageWindow;
use crate::application::repos::{
    CatalogRepo, CatalogTransaction, CatalogUnitOfWork, DishPatch, DishesRepo, DishesWriteRepo,
    MenusRepo, MenusWriteRepo, RepoError, SubmenusRepo, SubmenusWriteRepo, TitlePatch,
};
use crate::domain::entities::{
    DishRecord, MenuRecord, MenuSummary, MenuTree, SubmenuRecord, SubmenuSummary, SubmenuTree,
};
use crate::domain::types::EntityPath;

#[derive(Debug, Clone, Default)]
struct CatalogState {
    menus: Vec<MenuRecord>,
    submenus: Vec<SubmenuRecord>,
    dishes: Vec<DishRecord>,
}

impl CatalogState {
    fn menu(&self, menu_id: &str) -> Option<&MenuRecord> {
        self.menus.iter().find(|menu| menu.id == menu_id)
    }

    fn submenu_in(&self, menu_id: &str, submenu_id: &str) -> Option<&SubmenuRecord> {
        self.submenus
            .iter()
            .find(|submenu| submenu.id == submenu_id && submenu.menu_id == menu_id)
    }

    fn dish_index(&self, menu_id: &str, submenu_id: &str, dish_id: &str) -> Option<usize> {
        self.submenu_in(menu_id, submenu_id)?;
        self.dishes
            .iter()
            .position(|dish| dish.id == dish_id && dish.submenu_id == submenu_id)
    }

    fn dishes_in(&self, submenu_id: &str) -> impl Iterator<Item = &DishRecord> {
        self.dishes
            .iter()
            .filter(move |dish| dish.submenu_id == submenu_id)
    }

    fn submenu_summary(&self, submenu: &SubmenuRecord) -> SubmenuSummary {
        SubmenuSummary {
            dishes_count: self.dishes_in(&submenu.id).count() as u64,
            ..SubmenuSummary::without_children(submenu.clone())
        }
    }

    fn menu_summary(&self, menu: &MenuRecord) -> MenuSummary {
        let mut summary = MenuSummary::without_children(menu.clone());
        for submenu in self.submenus.iter().filter(|s| s.menu_id == menu.id) {
            summary.submenus_count += 1;
            summary.dishes_count += self.dishes_in(&submenu.id).count() as u64;
        }
        summary
    }

    fn insert_menu(&mut self, record: MenuRecord) -> Result<(), RepoError> {
        if self.menu(&record.id).is_some() {
            return Err(duplicate("menus_pkey"));
        }
        self.menus.push(record);
        Ok(())
    }

    fn insert_submenu(&mut self, record: SubmenuRecord) -> Result<(), RepoError> {
        if self.submenus.iter().any(|submenu| submenu.id == record.id) {
            return Err(duplicate("submenus_pkey"));
        }
        if self.menu(&record.menu_id).is_none() {
            return Err(missing_parent("menu", &record.menu_id));
        }
        self.submenus.push(record);
        Ok(())
    }

    fn insert_dish(&mut self, record: DishRecord) -> Result<(), RepoError> {
        if self.dishes.iter().any(|dish| dish.id == record.id) {
            return Err(duplicate("dishes_pkey"));
        }
        if !self
            .submenus
            .iter()
            .any(|submenu| submenu.id == record.submenu_id)
        {
            return Err(missing_parent("submenu", &record.submenu_id));
        }
        self.dishes.push(record);
        Ok(())
    }

    fn remove_dish_at(&mut self, menu_id: &str, index: usize) -> Vec<EntityPath> {
        let dish = self.dishes.remove(index);
        vec![EntityPath::dish(menu_id, dish.submenu_id, dish.id)]
    }

    fn remove_submenu(&mut self, submenu_id: &str) -> Vec<EntityPath> {
        let Some(index) = self.submenus.iter().position(|s| s.id == submenu_id) else {
            return Vec::new();
        };
        let submenu = self.submenus.remove(index);

        let mut removed = vec![EntityPath::submenu(&submenu.menu_id, &submenu.id)];
        self.dishes.retain(|dish| {
            if dish.submenu_id != submenu.id {
                return true;
            }
            removed.push(EntityPath::dish(&submenu.menu_id, &submenu.id, &dish.id));
            false
        });
        removed
    }

    fn remove_menu(&mut self, menu_id: &str) -> Vec<EntityPath> {
        let Some(index) = self.menus.iter().position(|menu| menu.id == menu_id) else {
            return Vec::new();
        };
        self.menus.remove(index);

        let mut removed = vec![EntityPath::menu(menu_id)];
        let children: Vec<String> = self
            .submenus
            .iter()
            .filter(|submenu| submenu.menu_id == menu_id)
            .map(|submenu| submenu.id.clone())
            .collect();
        for submenu_id in children {
            removed.extend(self.remove_submenu(&submenu_id));
        }
        removed
    }

    fn tree(&self) -> Vec<MenuTree> {
        self.menus
            .iter()
            .map(|menu| MenuTree {
                id: menu.id.clone(),
                title: menu.title.clone(),
                description: menu.description.clone(),
                submenus: self
                    .submenus
                    .iter()
                    .filter(|submenu| submenu.menu_id == menu.id)
                    .map(|submenu| SubmenuTree {
                        id: submenu.id.clone(),
                        title: submenu.title.clone(),
                        description: submenu.description.clone(),
                        dishes: self.dishes_in(&submenu.id).cloned().collect(),
                    })
                    .collect(),
            })
            .collect()
    }
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

fn missing_parent(level: &str, id: &str) -> RepoError {
    RepoError::Integrity {
        message: format!("{level} `{id}` does not exist"),
    }
}

fn apply_title_patch(title: &mut String, description: &mut String, patch: TitlePatch) {
    if let Some(value) = patch.title {
        *title = value;
    }
    if let Some(value) = patch.description {
        *description = value;
    }
}

#[derive(Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MenusRepo for MemoryCatalog {
    async fn list_menus(&self, window: PageWindow) -> Result<Vec<MenuSummary>, RepoError> {
        let state = self.state.lock().await;
        Ok(window.apply(state.menus.iter().map(|menu| state.menu_summary(menu))))
    }

    async fn find_menu(&self, menu_id: &str) -> Result<Option<MenuSummary>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.menu(menu_id).map(|menu| state.menu_summary(menu)))
    }
}

#[async_trait]
impl MenusWriteRepo for MemoryCatalog {
    async fn create_menu(&self, record: MenuRecord) -> Result<MenuSummary, RepoError> {
        let mut state = self.state.lock().await;
        state.insert_menu(record.clone())?;
        Ok(MenuSummary::without_children(record))
    }

    async fn update_menu(
        &self,
        menu_id: &str,
        patch: TitlePatch,
    ) -> Result<Option<MenuSummary>, RepoError> {
        let mut state = self.state.lock().await;
        let Some(menu) = state.menus.iter_mut().find(|menu| menu.id == menu_id) else {
            return Ok(None);
        };
        apply_title_patch(&mut menu.title, &mut menu.description, patch);
        let menu = menu.clone();
        Ok(Some(state.menu_summary(&menu)))
    }

    async fn delete_menu(&self, menu_id: &str) -> Result<Vec<EntityPath>, RepoError> {
        Ok(self.state.lock().await.remove_menu(menu_id))
    }

    async fn delete_all_menus(&self) -> Result<Vec<EntityPath>, RepoError> {
        let mut state = self.state.lock().await;
        let ids: Vec<String> = state.menus.iter().map(|menu| menu.id.clone()).collect();
        Ok(ids.iter().flat_map(|id| state.remove_menu(id)).collect())
    }
}

#[async_trait]
impl SubmenusRepo for MemoryCatalog {
    async fn list_submenus(
        &self,
        menu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<SubmenuSummary>, RepoError> {
        let state = self.state.lock().await;
        Ok(window.apply(
            state
                .submenus
                .iter()
                .filter(|submenu| submenu.menu_id == menu_id)
                .map(|submenu| state.submenu_summary(submenu)),
        ))
    }

    async fn find_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Option<SubmenuSummary>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .submenu_in(menu_id, submenu_id)
            .map(|submenu| state.submenu_summary(submenu)))
    }
}

#[async_trait]
impl SubmenusWriteRepo for MemoryCatalog {
    async fn create_submenu(&self, record: SubmenuRecord) -> Result<SubmenuSummary, RepoError> {
        let mut state = self.state.lock().await;
        state.insert_submenu(record.clone())?;
        Ok(SubmenuSummary::without_children(record))
    }

    async fn update_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
        patch: TitlePatch,
    ) -> Result<Option<SubmenuSummary>, RepoError> {
        let mut state = self.state.lock().await;
        let Some(submenu) = state
            .submenus
            .iter_mut()
            .find(|submenu| submenu.id == submenu_id && submenu.menu_id == menu_id)
        else {
            return Ok(None);
        };
        apply_title_patch(&mut submenu.title, &mut submenu.description, patch);
        let submenu = submenu.clone();
        Ok(Some(state.submenu_summary(&submenu)))
    }

    async fn delete_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError> {
        let mut state = self.state.lock().await;
        if state.submenu_in(menu_id, submenu_id).is_none() {
            return Ok(Vec::new());
        }
        Ok(state.remove_submenu(submenu_id))
    }

    async fn delete_all_submenus(&self, menu_id: &str) -> Result<Vec<EntityPath>, RepoError> {
        let mut state = self.state.lock().await;
        let ids: Vec<String> = state
            .submenus
            .iter()
            .filter(|submenu| submenu.menu_id == menu_id)
            .map(|submenu| submenu.id.clone())
            .collect();
        Ok(ids.iter().flat_map(|id| state.remove_submenu(id)).collect())
    }
}

#[async_trait]
impl DishesRepo for MemoryCatalog {
    async fn list_dishes(
        &self,
        menu_id: &str,
        submenu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<DishRecord>, RepoError> {
        let state = self.state.lock().await;
        if state.submenu_in(menu_id, submenu_id).is_none() {
            return Ok(Vec::new());
        }
        Ok(window.apply(state.dishes_in(submenu_id).cloned()))
    }

    async fn find_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<Option<DishRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .dish_index(menu_id, submenu_id, dish_id)
            .map(|index| state.dishes[index].clone()))
    }
}

#[async_trait]
impl DishesWriteRepo for MemoryCatalog {
    async fn create_dish(&self, record: DishRecord) -> Result<DishRecord, RepoError> {
        let mut state = self.state.lock().await;
        state.insert_dish(record.clone())?;
        Ok(record)
    }

    async fn update_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
        patch: DishPatch,
    ) -> Result<Option<DishRecord>, RepoError> {
        let mut state = self.state.lock().await;
        let Some(index) = state.dish_index(menu_id, submenu_id, dish_id) else {
            return Ok(None);
        };
        let dish = &mut state.dishes[index];
        if let Some(title) = patch.title {
            dish.title = title;
        }
        if let Some(description) = patch.description {
            dish.description = description;
        }
        if let Some(price) = patch.price {
            dish.price = price;
        }
        Ok(Some(dish.clone()))
    }

    async fn delete_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError> {
        let mut state = self.state.lock().await;
        Ok(match state.dish_index(menu_id, submenu_id, dish_id) {
            Some(index) => state.remove_dish_at(menu_id, index),
            None => Vec::new(),
        })
    }

    async fn delete_all_dishes(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError> {
        let mut state = self.state.lock().await;
        if state.submenu_in(menu_id, submenu_id).is_none() {
            return Ok(Vec::new());
        }
        let mut removed = Vec::new();
        state.dishes.retain(|dish| {
            if dish.submenu_id != submenu_id {
                return true;
            }
            removed.push(EntityPath::dish(menu_id, submenu_id, &dish.id));
            false
        });
        Ok(removed)
    }
}

#[async_trait]
impl CatalogRepo for MemoryCatalog {
    async fn load_catalog(&self) -> Result<Vec<MenuTree>, RepoError> {
        Ok(self.state.lock().await.tree())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl CatalogUnitOfWork for MemoryCatalog {
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>, RepoError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<CatalogState>,
    working: CatalogState,
}

impl MemoryTransaction {
    fn replace<T: Clone>(
        items: &mut [T],
        matches: impl Fn(&T) -> bool,
        record: &T,
    ) -> Result<(), RepoError> {
        let slot = items
            .iter_mut()
            .find(|item| matches(item))
            .ok_or(RepoError::NotFound)?;
        *slot = record.clone();
        Ok(())
    }
}

#[async_trait]
impl CatalogTransaction for MemoryTransaction {
    async fn menus(&mut self) -> Result<Vec<MenuRecord>, RepoError> {
        Ok(self.working.menus.clone())
    }

    async fn submenus_of(&mut self, menu_id: &str) -> Result<Vec<SubmenuRecord>, RepoError> {
        Ok(self
            .working
            .submenus
            .iter()
            .filter(|submenu| submenu.menu_id == menu_id)
            .cloned()
            .collect())
    }

    async fn dishes_of(&mut self, submenu_id: &str) -> Result<Vec<DishRecord>, RepoError> {
        Ok(self.working.dishes_in(submenu_id).cloned().collect())
    }

    async fn insert_menu(&mut self, record: &MenuRecord) -> Result<(), RepoError> {
        self.working.insert_menu(record.clone())
    }

    async fn update_menu(&mut self, record: &MenuRecord) -> Result<(), RepoError> {
        Self::replace(&mut self.working.menus, |menu| menu.id == record.id, record)
    }

    async fn delete_menu(&mut self, menu_id: &str) -> Result<(), RepoError> {
        self.working.remove_menu(menu_id);
        Ok(())
    }

    async fn insert_submenu(&mut self, record: &SubmenuRecord) -> Result<(), RepoError> {
        self.working.insert_submenu(record.clone())
    }

    async fn update_submenu(&mut self, record: &SubmenuRecord) -> Result<(), RepoError> {
        Self::replace(
            &mut self.working.submenus,
            |submenu| submenu.id == record.id,
            record,
        )
    }

    async fn delete_submenu(&mut self, submenu_id: &str) -> Result<(), RepoError> {
        self.working.remove_submenu(submenu_id);
        Ok(())
    }

    async fn insert_dish(&mut self, record: &DishRecord) -> Result<(), RepoError> {
        self.working.insert_dish(record.clone())
    }

    async fn update_dish(&mut self, record: &DishRecord) -> Result<(), RepoError> {
        Self::replace(&mut self.working.dishes, |dish| dish.id == record.id, record)
    }

    async fn delete_dish(&mut self, dish_id: &str) -> Result<(), RepoError> {
        self.working.dishes.retain(|dish| dish.id != dish_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
