use std::sync::Arc;

use crate::application::catalog::{CatalogService, DishService, MenuService, SubmenuService};

#[derive(Clone)]
pub struct ApiState {
    pub menus: Arc<MenuService>,
    pub submenus: Arc<SubmenuService>,
    pub dishes: Arc<DishService>,
    pub catalog: Arc<CatalogService>,
}
