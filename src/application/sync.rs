//! Feed reconciliation: diff an incoming menu tree against the store and apply the
//! minimal set of inserts, updates and deletes inside one transaction.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{CatalogTransaction, CatalogUnitOfWork, RepoError};
use crate::cache::{Invalidations, Mutation};
use crate::domain::entities::{DishRecord, MenuRecord, SubmenuRecord};
use crate::domain::error::DomainError;
use crate::domain::feed::{FeedMenu, FeedSnapshot, FeedSubmenu};
use crate::domain::types::EntityPath;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("workbook could not be read: {0}")]
    Workbook(String),
    #[error("feed json is invalid")]
    Json(#[from] serde_json::Error),
    #[error("feed rows are malformed")]
    Format(#[source] DomainError),
    #[error("unsupported feed extension `{0}`; expected .xlsx or .json")]
    UnsupportedExtension(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("feed rejected: {0}")]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A loaded feed together with a fingerprint of the bytes it came from.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub snapshot: FeedSnapshot,
    pub fingerprint: String,
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn load(&self) -> Result<FeedDocument, FeedError>;

    /// Human readable location, used in logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl LevelStats {
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.deleted
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub menus: LevelStats,
    pub submenus: LevelStats,
    pub dishes: LevelStats,
}

impl ReconcileStats {
    pub fn total(&self) -> u64 {
        self.menus.total() + self.submenus.total() + self.dishes.total()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    pub stats: ReconcileStats,
    pub invalidated: Invalidations,
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn CatalogUnitOfWork>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CatalogUnitOfWork>) -> Self {
        Self { store }
    }

    /// Make the stored tree equal to `snapshot`. Nothing is visible to readers until the
    /// single commit at the end; on error the transaction is dropped and rolled back.
    pub async fn reconcile(&self, snapshot: &FeedSnapshot) -> Result<ReconcileOutcome, SyncError> {
        snapshot.validate()?;

        let mut tx = self.store.begin().await?;
        let mut pass = Pass::default();

        let persisted: HashMap<String, MenuRecord> = tx
            .menus()
            .await?
            .into_iter()
            .map(|menu| (menu.id.clone(), menu))
            .collect();
        let mut seen: HashSet<&str> = HashSet::with_capacity(snapshot.menus.len());

        for feed_menu in &snapshot.menus {
            let record = MenuRecord {
                id: feed_menu.id.clone(),
                title: feed_menu.title.clone(),
                description: feed_menu.description.clone(),
            };
            let path = EntityPath::menu(&record.id);

            let existing_children = match persisted.get(&record.id) {
                Some(current) => {
                    if current != &record {
                        tx.update_menu(&record).await?;
                        pass.stats.menus.updated += 1;
                        pass.mutations.push(Mutation::updated(path));
                    }
                    tx.submenus_of(&record.id).await?
                }
                None => {
                    tx.insert_menu(&record).await?;
                    pass.stats.menus.inserted += 1;
                    pass.mutations.push(Mutation::created(path));
                    Vec::new()
                }
            };

            pass.reconcile_submenus(tx.as_mut(), feed_menu, existing_children)
                .await?;
            seen.insert(feed_menu.id.as_str());
        }

        pass.delete_staged(tx.as_mut()).await?;

        for menu_id in persisted.keys().filter(|id| !seen.contains(id.as_str())) {
            pass.delete_menu(tx.as_mut(), menu_id).await?;
        }

        tx.commit().await?;

        let mut invalidated = Invalidations::new();
        invalidated.record_all(&pass.mutations);

        info!(
            target = "menuboard::sync",
            menus = snapshot.menus.len(),
            dishes = snapshot.dish_count(),
            mutations = pass.stats.total(),
            keys = invalidated.len(),
            "Reconciled feed snapshot"
        );

        Ok(ReconcileOutcome {
            stats: pass.stats,
            invalidated,
        })
    }
}

/// State accumulated over one reconciliation walk.
#[derive(Default)]
struct Pass {
    stats: ReconcileStats,
    mutations: Vec<Mutation>,
    stale_dishes: Vec<EntityPath>,
    stale_submenus: Vec<(String, String)>,
}

impl Pass {
    async fn reconcile_submenus(
        &mut self,
        tx: &mut dyn CatalogTransaction,
        feed_menu: &FeedMenu,
        persisted: Vec<SubmenuRecord>,
    ) -> Result<(), SyncError> {
        let menu_id = feed_menu.id.as_str();
        let mut persisted: HashMap<String, SubmenuRecord> = persisted
            .into_iter()
            .map(|submenu| (submenu.id.clone(), submenu))
            .collect();

        for feed_submenu in &feed_menu.submenus {
            let record = SubmenuRecord {
                id: feed_submenu.id.clone(),
                menu_id: menu_id.to_string(),
                title: feed_submenu.title.clone(),
                description: feed_submenu.description.clone(),
            };
            let path = EntityPath::submenu(menu_id, &record.id);

            let existing_dishes = match persisted.remove(&record.id) {
                Some(current) => {
                    if current != record {
                        tx.update_submenu(&record).await?;
                        self.stats.submenus.updated += 1;
                        self.mutations.push(Mutation::updated(path));
                    }
                    tx.dishes_of(&record.id).await?
                }
                None => {
                    tx.insert_submenu(&record).await?;
                    self.stats.submenus.inserted += 1;
                    self.mutations.push(Mutation::created(path));
                    Vec::new()
                }
            };

            self.reconcile_dishes(tx, menu_id, feed_submenu, existing_dishes)
                .await?;
        }

        self.stale_submenus.extend(
            persisted
                .into_keys()
                .map(|submenu_id| (menu_id.to_string(), submenu_id)),
        );
        Ok(())
    }

    async fn reconcile_dishes(
        &mut self,
        tx: &mut dyn CatalogTransaction,
        menu_id: &str,
        feed_submenu: &FeedSubmenu,
        persisted: Vec<DishRecord>,
    ) -> Result<(), SyncError> {
        let submenu_id = feed_submenu.id.as_str();
        let mut persisted: HashMap<String, DishRecord> = persisted
            .into_iter()
            .map(|dish| (dish.id.clone(), dish))
            .collect();

        for feed_dish in &feed_submenu.dishes {
            let record = DishRecord {
                id: feed_dish.id.clone(),
                submenu_id: submenu_id.to_string(),
                title: feed_dish.title.clone(),
                description: feed_dish.description.clone(),
                price: feed_dish.stored_price()?,
            };
            let path = EntityPath::dish(menu_id, submenu_id, &record.id);

            match persisted.remove(&record.id) {
                Some(current) if current == record => {}
                Some(_) => {
                    tx.update_dish(&record).await?;
                    self.stats.dishes.updated += 1;
                    self.mutations.push(Mutation::updated(path));
                }
                None => {
                    tx.insert_dish(&record).await?;
                    self.stats.dishes.inserted += 1;
                    self.mutations.push(Mutation::created(path));
                }
            }
        }

        self.stale_dishes.extend(
            persisted
                .into_keys()
                .map(|dish_id| EntityPath::dish(menu_id, submenu_id, dish_id)),
        );
        Ok(())
    }

    /// Staged dishes first, then staged submenus together with their remaining dishes.
    async fn delete_staged(&mut self, tx: &mut dyn CatalogTransaction) -> Result<(), SyncError> {
        for path in std::mem::take(&mut self.stale_dishes) {
            if let EntityPath::Dish { dish_id, .. } = &path {
                tx.delete_dish(dish_id).await?;
            }
            self.stats.dishes.deleted += 1;
            self.mutations.push(Mutation::deleted(path));
        }

        for (menu_id, submenu_id) in std::mem::take(&mut self.stale_submenus) {
            self.delete_submenu(tx, &menu_id, &submenu_id).await?;
        }
        Ok(())
    }

    async fn delete_submenu(
        &mut self,
        tx: &mut dyn CatalogTransaction,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<(), SyncError> {
        let cascaded = tx.dishes_of(submenu_id).await?;
        tx.delete_submenu(submenu_id).await?;

        self.stats.submenus.deleted += 1;
        self.mutations
            .push(Mutation::deleted(EntityPath::submenu(menu_id, submenu_id)));
        for dish in cascaded {
            self.stats.dishes.deleted += 1;
            self.mutations.push(Mutation::deleted(EntityPath::dish(
                menu_id, submenu_id, dish.id,
            )));
        }
        Ok(())
    }

    async fn delete_menu(
        &mut self,
        tx: &mut dyn CatalogTransaction,
        menu_id: &str,
    ) -> Result<(), SyncError> {
        for submenu in tx.submenus_of(menu_id).await? {
            for dish in tx.dishes_of(&submenu.id).await? {
                self.stats.dishes.deleted += 1;
                self.mutations.push(Mutation::deleted(EntityPath::dish(
                    menu_id,
                    &submenu.id,
                    dish.id,
                )));
            }
            self.stats.submenus.deleted += 1;
            self.mutations
                .push(Mutation::deleted(EntityPath::submenu(menu_id, submenu.id)));
        }
        tx.delete_menu(menu_id).await?;

        self.stats.menus.deleted += 1;
        self.mutations
            .push(Mutation::deleted(EntityPath::menu(menu_id)));
        Ok(())
    }
}
