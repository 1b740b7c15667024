use async_trait::async_trait;

use crate::{
    application::pagination::PageWindow,
    application::repos::{DishPatch, DishesRepo, DishesWriteRepo, RepoError},
    domain::entities::DishRecord,
    domain::types::EntityPath,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct DishRow {
    pub(super) id: String,
    pub(super) submenu_id: String,
    pub(super) title: String,
    pub(super) description: String,
    pub(super) price: String,
}

impl From<DishRow> for DishRecord {
    fn from(row: DishRow) -> Self {
        Self {
            id: row.id,
            submenu_id: row.submenu_id,
            title: row.title,
            description: row.description,
            price: row.price,
        }
    }
}

#[async_trait]
impl DishesRepo for PostgresRepositories {
    async fn list_dishes(
        &self,
        menu_id: &str,
        submenu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<DishRecord>, RepoError> {
        let rows: Vec<DishRow> = sqlx::query_as(
            r#"
            SELECT d.id, d.submenu_id, d.title, d.description, d.price
            FROM dishes d
            INNER JOIN submenus s ON s.id = d.submenu_id
            WHERE s.menu_id = $1 AND d.submenu_id = $2
            ORDER BY d.seq
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(window.offset_i64())
        .bind(window.limit_i64())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DishRecord::from).collect())
    }

    async fn find_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<Option<DishRecord>, RepoError> {
        let row: Option<DishRow> = sqlx::query_as(
            r#"
            SELECT d.id, d.submenu_id, d.title, d.description, d.price
            FROM dishes d
            INNER JOIN submenus s ON s.id = d.submenu_id
            WHERE s.menu_id = $1 AND d.submenu_id = $2 AND d.id = $3
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(dish_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(DishRecord::from))
    }
}

#[async_trait]
impl DishesWriteRepo for PostgresRepositories {
    async fn create_dish(&self, record: DishRecord) -> Result<DishRecord, RepoError> {
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
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(record)
    }

    async fn update_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
        patch: DishPatch,
    ) -> Result<Option<DishRecord>, RepoError> {
        let row: Option<DishRow> = sqlx::query_as(
            r#"
            UPDATE dishes d
            SET title = COALESCE($4, d.title),
                description = COALESCE($5, d.description),
                price = COALESCE($6, d.price)
            FROM submenus s
            WHERE s.id = d.submenu_id
              AND s.menu_id = $1 AND d.submenu_id = $2 AND d.id = $3
            RETURNING d.id, d.submenu_id, d.title, d.description, d.price
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(dish_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.price)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(DishRecord::from))
    }

    async fn delete_dish(
        &self,
        menu_id: &str,
        submenu_id: &str,
        dish_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError> {
        let deleted: Vec<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM dishes d
            USING submenus s
            WHERE s.id = d.submenu_id
              AND s.menu_id = $1 AND d.submenu_id = $2 AND d.id = $3
            RETURNING d.id
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(dish_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(deleted
            .into_iter()
            .map(|(id,)| EntityPath::dish(menu_id, submenu_id, id))
            .collect())
    }

    async fn delete_all_dishes(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError> {
        let deleted: Vec<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM dishes d
            USING submenus s
            WHERE s.id = d.submenu_id
              AND s.menu_id = $1 AND d.submenu_id = $2
            RETURNING d.id
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(deleted
            .into_iter()
            .map(|(id,)| EntityPath::dish(menu_id, submenu_id, id))
            .collect())
    }
}
