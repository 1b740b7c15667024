//! Invalidation policy: which cache keys a committed mutation makes stale.
//!
//! | mutation | keys |
//! |---|---|
//! | menu create / update | menu, menus |
//! | menu delete | menu, menus, submenus(menu) |
//! | submenu create / update | submenu, submenus, menu, menus |
//! | submenu delete | submenu, submenus, menu, menus, dishes(submenu) |
//! | dish update | dish, dishes, submenu, menu |
//! | dish create / delete | dish, dishes, submenu, menu, submenus, menus |
//!
//! Collection keys always use the default window, the only window that is cached.
//! Deleting a parent also drops its own child collection so a cached empty list
//! cannot outlive the parent. Cascaded children are recorded as their own deletes.

use std::collections::BTreeSet;

use crate::application::pagination::PageWindow;
use crate::domain::types::EntityPath;

use super::keys::CacheKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mutation {
    pub operation: Operation,
    pub path: EntityPath,
}

impl Mutation {
    pub fn created(path: EntityPath) -> Self {
        Self {
            operation: Operation::Create,
            path,
        }
    }

    pub fn updated(path: EntityPath) -> Self {
        Self {
            operation: Operation::Update,
            path,
        }
    }

    pub fn deleted(path: EntityPath) -> Self {
        Self {
            operation: Operation::Delete,
            path,
        }
    }
}

/// Keys to drop after `mutation` commits.
pub fn keys_for(mutation: &Mutation) -> Vec<CacheKey> {
    let window = PageWindow::default();
    let operation = mutation.operation;

    match &mutation.path {
        EntityPath::Menu { menu_id } => {
            let mut keys = vec![CacheKey::menu(menu_id), CacheKey::menus(window)];
            if operation == Operation::Delete {
                keys.push(CacheKey::submenus(menu_id, window));
            }
            keys
        }
        EntityPath::Submenu {
            menu_id,
            submenu_id,
        } => {
            let mut keys = vec![
                CacheKey::submenu(menu_id, submenu_id),
                CacheKey::submenus(menu_id, window),
                CacheKey::menu(menu_id),
                CacheKey::menus(window),
            ];
            if operation == Operation::Delete {
                keys.push(CacheKey::dishes(menu_id, submenu_id, window));
            }
            keys
        }
        EntityPath::Dish {
            menu_id,
            submenu_id,
            dish_id,
        } => {
            let mut keys = vec![
                CacheKey::dish(menu_id, submenu_id, dish_id),
                CacheKey::dishes(menu_id, submenu_id, window),
                CacheKey::submenu(menu_id, submenu_id),
                CacheKey::menu(menu_id),
            ];
            if operation != Operation::Update {
                keys.push(CacheKey::submenus(menu_id, window));
                keys.push(CacheKey::menus(window));
            }
            keys
        }
    }
}

/// Deduplicated, ordered set of keys accumulated over one or more mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidations {
    keys: BTreeSet<CacheKey>,
    mutations: usize,
}

impl Invalidations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, mutation: &Mutation) {
        self.mutations += 1;
        self.keys.extend(keys_for(mutation));
    }

    pub fn record_all<'a>(&mut self, mutations: impl IntoIterator<Item = &'a Mutation>) {
        for mutation in mutations {
            self.record(mutation);
        }
    }

    pub fn insert(&mut self, key: CacheKey) {
        self.keys.insert(key);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of mutations recorded, not the number of distinct keys.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(keys: Vec<CacheKey>) -> BTreeSet<String> {
        keys.into_iter().map(|key| key.to_string()).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn menu_update_drops_detail_and_global_list() {
        let keys = keys_for(&Mutation::updated(EntityPath::menu("m1")));
        assert_eq!(rendered(keys), set(&["menu:m1", "menus:0:100"]));
    }

    #[test]
    fn menu_delete_also_drops_its_submenu_list() {
        let keys = keys_for(&Mutation::deleted(EntityPath::menu("m1")));
        assert_eq!(
            rendered(keys),
            set(&["menu:m1", "menus:0:100", "submenus:m1:0:100"])
        );
    }

    #[test]
    fn submenu_create_touches_parent_keys() {
        let keys = keys_for(&Mutation::created(EntityPath::submenu("m1", "s1")));
        assert_eq!(
            rendered(keys),
            set(&["submenu:m1:s1", "submenus:m1:0:100", "menu:m1", "menus:0:100"])
        );
    }

    #[test]
    fn dish_update_leaves_collection_counts_alone() {
        let keys = keys_for(&Mutation::updated(EntityPath::dish("m1", "s1", "d1")));
        assert_eq!(
            rendered(keys),
            set(&[
                "dish:m1:s1:d1",
                "dishes:m1:s1:0:100",
                "submenu:m1:s1",
                "menu:m1"
            ])
        );
    }

    #[test]
    fn dish_delete_drops_every_ancestor_view() {
        let keys = keys_for(&Mutation::deleted(EntityPath::dish("m1", "s1", "d1")));
        assert_eq!(
            rendered(keys),
            set(&[
                "dish:m1:s1:d1",
                "dishes:m1:s1:0:100",
                "submenu:m1:s1",
                "submenus:m1:0:100",
                "menu:m1",
                "menus:0:100",
            ])
        );
    }

    #[test]
    fn dish_create_matches_dish_delete() {
        let path = EntityPath::dish("m1", "s1", "d1");
        assert_eq!(
            rendered(keys_for(&Mutation::created(path.clone()))),
            rendered(keys_for(&Mutation::deleted(path)))
        );
    }

    #[test]
    fn invalidations_deduplicate_shared_ancestors() {
        let mut invalidations = Invalidations::new();
        invalidations.record(&Mutation::updated(EntityPath::dish("m1", "s1", "d1")));
        invalidations.record(&Mutation::updated(EntityPath::dish("m1", "s1", "d2")));

        assert_eq!(invalidations.mutation_count(), 2);
        // two dish keys + shared dishes, submenu and menu keys
        assert_eq!(invalidations.len(), 5);
        assert!(invalidations.contains(&CacheKey::menu("m1")));
    }
}
