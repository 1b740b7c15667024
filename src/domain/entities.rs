//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRecord {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuRecord {
    pub id: String,
    pub menu_id: String,
    pub title: String,
    pub description: String,
}

/// Dish as persisted. `price` is already discounted; discounts never reach storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    pub id: String,
    pub submenu_id: String,
    pub title: String,
    pub description: String,
    pub price: String,
}

/// Menu read model with aggregate counts over its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub submenus_count: u64,
    pub dishes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuSummary {
    pub id: String,
    pub menu_id: String,
    pub title: String,
    pub description: String,
    pub dishes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuTree {
    pub id: String,
    pub title: String,
    pub description: String,
    pub submenus: Vec<SubmenuTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuTree {
    pub id: String,
    pub title: String,
    pub description: String,
    pub dishes: Vec<DishRecord>,
}

impl MenuSummary {
    pub fn without_children(record: MenuRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            submenus_count: 0,
            dishes_count: 0,
        }
    }
}

impl SubmenuSummary {
    pub fn without_children(record: SubmenuRecord) -> Self {
        Self {
            id: record.id,
            menu_id: record.menu_id,
            title: record.title,
            description: record.description,
            dishes_count: 0,
        }
    }
}
