use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::{
    application::repos::{CatalogTransaction, CatalogUnitOfWork, RepoError},
    domain::entities::{DishRecord, MenuRecord, SubmenuRecord},
};

use super::catalog::{MenuRow, SubmenuRow};
use super::dishes::DishRow;
use super::{PostgresRepositories, map_sqlx_error};

/// Catalog transaction backed by a single Postgres transaction.
pub struct PgCatalogTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogUnitOfWork for PostgresRepositories {
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>, RepoError> {
        let tx = self.pool().begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgCatalogTransaction { tx }))
    }
}

#[async_trait]
impl CatalogTransaction for PgCatalogTransaction {
    async fn menus(&mut self) -> Result<Vec<MenuRecord>, RepoError> {
        let rows: Vec<MenuRow> =
            sqlx::query_as("SELECT id, title, description FROM menus ORDER BY seq")
                .fetch_all(&mut *self.tx)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuRecord::from).collect())
    }

    async fn submenus_of(&mut self, menu_id: &str) -> Result<Vec<SubmenuRecord>, RepoError> {
        let rows: Vec<SubmenuRow> = sqlx::query_as(
            "SELECT id, menu_id, title, description FROM submenus WHERE menu_id = $1 ORDER BY seq",
        )
        .bind(menu_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubmenuRecord::from).collect())
    }

    async fn dishes_of(&mut self, submenu_id: &str) -> Result<Vec<DishRecord>, RepoError> {
        let rows: Vec<DishRow> = sqlx::query_as(
            r#"
            SELECT id, submenu_id, title, description, price
            FROM dishes
            WHERE submenu_id = $1
            ORDER BY seq
            "#,
        )
        .bind(submenu_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DishRecord::from).collect())
    }

    async fn insert_menu(&mut self, record: &MenuRecord) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO menus (id, title, description) VALUES ($1, $2, $3)")
            .bind(&record.id)
            .bind(&record.title)
            .bind(&record.description)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_menu(&mut self, record: &MenuRecord) -> Result<(), RepoError> {
        sqlx::query("UPDATE menus SET title = $2, description = $3 WHERE id = $1")
            .bind(&record.id)
            .bind(&record.title)
            .bind(&record.description)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_menu(&mut self, menu_id: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(menu_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert_submenu(&mut self, record: &SubmenuRecord) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO submenus (id, menu_id, title, description) VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.id)
        .bind(&record.menu_id)
        .bind(&record.title)
        .bind(&record.description)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_submenu(&mut self, record: &SubmenuRecord) -> Result<(), RepoError> {
        sqlx::query("UPDATE submenus SET title = $2, description = $3 WHERE id = $1")
            .bind(&record.id)
            .bind(&record.title)
            .bind(&record.description)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_submenu(&mut self, submenu_id: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM submenus WHERE id = $1")
            .bind(submenu_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert_dish(&mut self, record: &DishRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO dishes (id, submenu_id, title, description, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.id)
        .bind(&record.submenu_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.price)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_dish(&mut self, record: &DishRecord) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE dishes SET title = $2, description = $3, price = $4 WHERE id = $1",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.price)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_dish(&mut self, dish_id: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM dishes WHERE id = $1")
            .bind(dish_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
