use async_trait::async_trait;

use crate::{
    application::pagination::PageWindow,
    application::repos::{MenusRepo, MenusWriteRepo, RepoError, TitlePatch},
    domain::entities::{MenuRecord, MenuSummary},
    domain::types::EntityPath,
};

use super::util::convert_count;
use super::{PostgresRepositories, map_sqlx_error, submenu_subtree};

#[derive(sqlx::FromRow)]
struct MenuSummaryRow {
    id: String,
    title: String,
    description: String,
    submenus_count: i64,
    dishes_count: i64,
}

impl TryFrom<MenuSummaryRow> for MenuSummary {
    type Error = RepoError;

    fn try_from(row: MenuSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            submenus_count: convert_count(row.submenus_count)?,
            dishes_count: convert_count(row.dishes_count)?,
        })
    }
}

const MENU_COUNTS: &str = r#"
    (SELECT COUNT(*) FROM submenus s WHERE s.menu_id = m.id) AS submenus_count,
    (SELECT COUNT(*)
       FROM dishes d
       INNER JOIN submenus s ON s.id = d.submenu_id
      WHERE s.menu_id = m.id) AS dishes_count
"#;

#[async_trait]
impl MenusRepo for PostgresRepositories {
    async fn list_menus(&self, window: PageWindow) -> Result<Vec<MenuSummary>, RepoError> {
        let sql = format!(
            "SELECT m.id, m.title, m.description, {MENU_COUNTS} \
             FROM menus m ORDER BY m.seq OFFSET $1 LIMIT $2"
        );
        let rows: Vec<MenuSummaryRow> = sqlx::query_as(&sql)
            .bind(window.offset_i64())
            .bind(window.limit_i64())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(MenuSummary::try_from).collect()
    }

    async fn find_menu(&self, menu_id: &str) -> Result<Option<MenuSummary>, RepoError> {
        let sql = format!(
            "SELECT m.id, m.title, m.description, {MENU_COUNTS} \
             FROM menus m WHERE m.id = $1"
        );
        let row: Option<MenuSummaryRow> = sqlx::query_as(&sql)
            .bind(menu_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(MenuSummary::try_from).transpose()
    }
}

#[async_trait]
impl MenusWriteRepo for PostgresRepositories {
    async fn create_menu(&self, record: MenuRecord) -> Result<MenuSummary, RepoError> {
        sqlx::query("INSERT INTO menus (id, title, description) VALUES ($1, $2, $3)")
            .bind(&record.id)
            .bind(&record.title)
            .bind(&record.description)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(MenuSummary::without_children(record))
    }

    async fn update_menu(
        &self,
        menu_id: &str,
        patch: TitlePatch,
    ) -> Result<Option<MenuSummary>, RepoError> {
        let sql = format!(
            "UPDATE menus m \
             SET title = COALESCE($2, m.title), description = COALESCE($3, m.description) \
             WHERE m.id = $1 \
             RETURNING m.id, m.title, m.description, {MENU_COUNTS}"
        );
        let row: Option<MenuSummaryRow> = sqlx::query_as(&sql)
            .bind(menu_id)
            .bind(patch.title)
            .bind(patch.description)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(MenuSummary::try_from).transpose()
    }

    async fn delete_menu(&self, menu_id: &str) -> Result<Vec<EntityPath>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let children = submenu_subtree(&mut tx, Some(menu_id), None).await?;
        let deleted = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        if deleted == 0 {
            return Ok(Vec::new());
        }
        tx.commit().await.map_err(map_sqlx_error)?;

        let mut removed = vec![EntityPath::menu(menu_id)];
        removed.extend(children);
        Ok(removed)
    }

    async fn delete_all_menus(&self) -> Result<Vec<EntityPath>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let children = submenu_subtree(&mut tx, None, None).await?;
        let menus: Vec<(String,)> = sqlx::query_as("DELETE FROM menus RETURNING id")
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        let mut removed: Vec<EntityPath> = menus
            .into_iter()
            .map(|(menu_id,)| EntityPath::menu(menu_id))
            .collect();
        removed.extend(children);
        Ok(removed)
    }
}
