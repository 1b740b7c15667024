//! Cache key definitions.
//!
//! Keys render to the same strings the gateway stores them under, one family per
//! read endpoint:
//!
//! - `menu:{menu}` / `menus:{skip}:{limit}`
//! - `submenu:{menu}:{submenu}` / `submenus:{menu}:{skip}:{limit}`
//! - `dish:{menu}:{submenu}:{dish}` / `dishes:{menu}:{submenu}:{skip}:{limit}`
//!
//! Ids are percent-escaped (`%` and `:`) so every rendered segment is free of the
//! separator and two distinct paths never share a key.

use std::fmt;

use crate::application::pagination::PageWindow;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    Menu {
        menu_id: String,
    },
    Menus {
        window: PageWindow,
    },
    Submenu {
        menu_id: String,
        submenu_id: String,
    },
    Submenus {
        menu_id: String,
        window: PageWindow,
    },
    Dish {
        menu_id: String,
        submenu_id: String,
        dish_id: String,
    },
    Dishes {
        menu_id: String,
        submenu_id: String,
        window: PageWindow,
    },
}

impl CacheKey {
    pub fn menu(menu_id: &str) -> Self {
        Self::Menu {
            menu_id: menu_id.to_string(),
        }
    }

    pub fn menus(window: PageWindow) -> Self {
        Self::Menus { window }
    }

    pub fn submenu(menu_id: &str, submenu_id: &str) -> Self {
        Self::Submenu {
            menu_id: menu_id.to_string(),
            submenu_id: submenu_id.to_string(),
        }
    }

    pub fn submenus(menu_id: &str, window: PageWindow) -> Self {
        Self::Submenus {
            menu_id: menu_id.to_string(),
            window,
        }
    }

    pub fn dish(menu_id: &str, submenu_id: &str, dish_id: &str) -> Self {
        Self::Dish {
            menu_id: menu_id.to_string(),
            submenu_id: submenu_id.to_string(),
            dish_id: dish_id.to_string(),
        }
    }

    pub fn dishes(menu_id: &str, submenu_id: &str, window: PageWindow) -> Self {
        Self::Dishes {
            menu_id: menu_id.to_string(),
            submenu_id: submenu_id.to_string(),
            window,
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            CacheKey::Menu { .. } => "menu",
            CacheKey::Menus { .. } => "menus",
            CacheKey::Submenu { .. } => "submenu",
            CacheKey::Submenus { .. } => "submenus",
            CacheKey::Dish { .. } => "dish",
            CacheKey::Dishes { .. } => "dishes",
        }
    }
}

/// Renders an id with `%` and `:` escaped.
struct Segment<'a>(&'a str);

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(at) = rest.find(['%', ':']) {
            f.write_str(&rest[..at])?;
            f.write_str(if rest.as_bytes()[at] == b'%' { "%25" } else { "%3A" })?;
            rest = &rest[at + 1..];
        }
        f.write_str(rest)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Menu { menu_id } => write!(f, "menu:{}", Segment(menu_id)),
            CacheKey::Menus { window } => write!(f, "menus:{}:{}", window.skip, window.limit),
            CacheKey::Submenu {
                menu_id,
                submenu_id,
            } => write!(f, "submenu:{}:{}", Segment(menu_id), Segment(submenu_id)),
            CacheKey::Submenus { menu_id, window } => write!(
                f,
                "submenus:{}:{}:{}",
                Segment(menu_id),
                window.skip,
                window.limit
            ),
            CacheKey::Dish {
                menu_id,
                submenu_id,
                dish_id,
            } => write!(
                f,
                "dish:{}:{}:{}",
                Segment(menu_id),
                Segment(submenu_id),
                Segment(dish_id)
            ),
            CacheKey::Dishes {
                menu_id,
                submenu_id,
                window,
            } => write!(
                f,
                "dishes:{}:{}:{}:{}",
                Segment(menu_id),
                Segment(submenu_id),
                window.skip,
                window.limit
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_stable_strings() {
        let window = PageWindow::default();
        assert_eq!(CacheKey::menu("m1").to_string(), "menu:m1");
        assert_eq!(CacheKey::menus(window).to_string(), "menus:0:100");
        assert_eq!(CacheKey::submenu("m1", "s1").to_string(), "submenu:m1:s1");
        assert_eq!(
            CacheKey::submenus("m1", PageWindow::new(5, 10)).to_string(),
            "submenus:m1:5:10"
        );
        assert_eq!(CacheKey::dish("m1", "s1", "d1").to_string(), "dish:m1:s1:d1");
        assert_eq!(
            CacheKey::dishes("m1", "s1", window).to_string(),
            "dishes:m1:s1:0:100"
        );
    }

    #[test]
    fn ids_containing_separators_never_collide() {
        let left = CacheKey::submenu("a:b", "c");
        let right = CacheKey::submenu("a", "b:c");
        assert_ne!(left.to_string(), right.to_string());
        assert_eq!(left.to_string(), "submenu:a%3Ab:c");
        assert_eq!(right.to_string(), "submenu:a:b%3Ac");

        assert_ne!(
            CacheKey::dish("a", "b:c", "d").to_string(),
            CacheKey::dish("a:b", "c", "d").to_string()
        );
        assert_eq!(CacheKey::menu("50%:x").to_string(), "menu:50%25%3Ax");
        assert_ne!(
            CacheKey::menu("%3A").to_string(),
            CacheKey::menu(":").to_string()
        );
    }
}
