//! Shared value types for the catalog hierarchy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Location of a single entity inside the menu → submenu → dish tree.
///
/// Carries every ancestor id so cache keys can be derived without a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum EntityPath {
    Menu {
        menu_id: String,
    },
    Submenu {
        menu_id: String,
        submenu_id: String,
    },
    Dish {
        menu_id: String,
        submenu_id: String,
        dish_id: String,
    },
}

impl EntityPath {
    pub fn menu(menu_id: impl Into<String>) -> Self {
        Self::Menu {
            menu_id: menu_id.into(),
        }
    }

    pub fn submenu(menu_id: impl Into<String>, submenu_id: impl Into<String>) -> Self {
        Self::Submenu {
            menu_id: menu_id.into(),
            submenu_id: submenu_id.into(),
        }
    }

    pub fn dish(
        menu_id: impl Into<String>,
        submenu_id: impl Into<String>,
        dish_id: impl Into<String>,
    ) -> Self {
        Self::Dish {
            menu_id: menu_id.into(),
            submenu_id: submenu_id.into(),
            dish_id: dish_id.into(),
        }
    }

    pub fn level(&self) -> EntityLevel {
        match self {
            EntityPath::Menu { .. } => EntityLevel::Menu,
            EntityPath::Submenu { .. } => EntityLevel::Submenu,
            EntityPath::Dish { .. } => EntityLevel::Dish,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLevel {
    Menu,
    Submenu,
    Dish,
}

impl EntityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityLevel::Menu => "menu",
            EntityLevel::Submenu => "submenu",
            EntityLevel::Dish => "dish",
        }
    }
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
