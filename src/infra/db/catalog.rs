use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    application::repos::{CatalogRepo, RepoError},
    domain::entities::{DishRecord, MenuRecord, MenuTree, SubmenuRecord, SubmenuTree},
};

use super::dishes::DishRow;
use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct MenuRow {
    id: String,
    title: String,
    description: String,
}

impl From<MenuRow> for MenuRecord {
    fn from(row: MenuRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct SubmenuRow {
    id: String,
    menu_id: String,
    title: String,
    description: String,
}

impl From<SubmenuRow> for SubmenuRecord {
    fn from(row: SubmenuRow) -> Self {
        Self {
            id: row.id,
            menu_id: row.menu_id,
            title: row.title,
            description: row.description,
        }
    }
}

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn load_catalog(&self) -> Result<Vec<MenuTree>, RepoError> {
        let menus: Vec<MenuRow> =
            sqlx::query_as("SELECT id, title, description FROM menus ORDER BY seq")
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        let submenus: Vec<SubmenuRow> = sqlx::query_as(
            "SELECT id, menu_id, title, description FROM submenus ORDER BY seq",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        let dishes: Vec<DishRow> = sqlx::query_as(
            "SELECT id, submenu_id, title, description, price FROM dishes ORDER BY seq",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let menus = menus.into_iter().map(MenuRecord::from).collect();
        let submenus = submenus.into_iter().map(SubmenuRecord::from).collect();
        let dishes = dishes.into_iter().map(DishRecord::from).collect();

        Ok(assemble_tree(menus, submenus, dishes))
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        PostgresRepositories::health_check(self)
            .await
            .map_err(map_sqlx_error)
    }
}

/// Groups flat rows into nested trees, keeping the input order at every level.
fn assemble_tree(
    menus: Vec<MenuRecord>,
    submenus: Vec<SubmenuRecord>,
    dishes: Vec<DishRecord>,
) -> Vec<MenuTree> {
    let mut dishes_by_submenu: HashMap<String, Vec<DishRecord>> = HashMap::new();
    for dish in dishes {
        dishes_by_submenu
            .entry(dish.submenu_id.clone())
            .or_default()
            .push(dish);
    }

    let mut submenus_by_menu: HashMap<String, Vec<SubmenuTree>> = HashMap::new();
    for submenu in submenus {
        let dishes = dishes_by_submenu.remove(&submenu.id).unwrap_or_default();
        submenus_by_menu
            .entry(submenu.menu_id)
            .or_default()
            .push(SubmenuTree {
                id: submenu.id,
                title: submenu.title,
                description: submenu.description,
                dishes,
            });
    }

    menus
        .into_iter()
        .map(|menu| MenuTree {
            submenus: submenus_by_menu.remove(&menu.id).unwrap_or_default(),
            id: menu.id,
            title: menu.title,
            description: menu.description,
        })
        .collect()
}
