use async_trait::async_trait;

use crate::{
    application::pagination::PageWindow,
    application::repos::{RepoError, SubmenusRepo, SubmenusWriteRepo, TitlePatch},
    domain::entities::{SubmenuRecord, SubmenuSummary},
    domain::types::EntityPath,
};

use super::util::convert_count;
use super::{PostgresRepositories, map_sqlx_error, submenu_subtree};

#[derive(sqlx::FromRow)]
struct SubmenuSummaryRow {
    id: String,
    menu_id: String,
    title: String,
    description: String,
    dishes_count: i64,
}

impl TryFrom<SubmenuSummaryRow> for SubmenuSummary {
    type Error = RepoError;

    fn try_from(row: SubmenuSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            menu_id: row.menu_id,
            title: row.title,
            description: row.description,
            dishes_count: convert_count(row.dishes_count)?,
        })
    }
}

const SUBMENU_COLUMNS: &str = r#"
    s.id, s.menu_id, s.title, s.description,
    (SELECT COUNT(*) FROM dishes d WHERE d.submenu_id = s.id) AS dishes_count
"#;

#[async_trait]
impl SubmenusRepo for PostgresRepositories {
    async fn list_submenus(
        &self,
        menu_id: &str,
        window: PageWindow,
    ) -> Result<Vec<SubmenuSummary>, RepoError> {
        let sql = format!(
            "SELECT {SUBMENU_COLUMNS} FROM submenus s \
             WHERE s.menu_id = $1 ORDER BY s.seq OFFSET $2 LIMIT $3"
        );
        let rows: Vec<SubmenuSummaryRow> = sqlx::query_as(&sql)
            .bind(menu_id)
            .bind(window.offset_i64())
            .bind(window.limit_i64())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(SubmenuSummary::try_from).collect()
    }

    async fn find_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Option<SubmenuSummary>, RepoError> {
        let sql = format!(
            "SELECT {SUBMENU_COLUMNS} FROM submenus s \
             WHERE s.menu_id = $1 AND s.id = $2"
        );
        let row: Option<SubmenuSummaryRow> = sqlx::query_as(&sql)
            .bind(menu_id)
            .bind(submenu_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(SubmenuSummary::try_from).transpose()
    }
}

#[async_trait]
impl SubmenusWriteRepo for PostgresRepositories {
    async fn create_submenu(&self, record: SubmenuRecord) -> Result<SubmenuSummary, RepoError> {
        sqlx::query(
            "INSERT INTO submenus (id, menu_id, title, description) VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.id)
        .bind(&record.menu_id)
        .bind(&record.title)
        .bind(&record.description)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SubmenuSummary::without_children(record))
    }

    async fn update_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
        patch: TitlePatch,
    ) -> Result<Option<SubmenuSummary>, RepoError> {
        let sql = format!(
            "UPDATE submenus s \
             SET title = COALESCE($3, s.title), description = COALESCE($4, s.description) \
             WHERE s.menu_id = $1 AND s.id = $2 \
             RETURNING {SUBMENU_COLUMNS}"
        );
        let row: Option<SubmenuSummaryRow> = sqlx::query_as(&sql)
            .bind(menu_id)
            .bind(submenu_id)
            .bind(patch.title)
            .bind(patch.description)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(SubmenuSummary::try_from).transpose()
    }

    async fn delete_submenu(
        &self,
        menu_id: &str,
        submenu_id: &str,
    ) -> Result<Vec<EntityPath>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let removed = submenu_subtree(&mut tx, Some(menu_id), Some(submenu_id)).await?;
        if removed.is_empty() {
            return Ok(removed);
        }
        sqlx::query("DELETE FROM submenus WHERE menu_id = $1 AND id = $2")
            .bind(menu_id)
            .bind(submenu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(removed)
    }

    async fn delete_all_submenus(&self, menu_id: &str) -> Result<Vec<EntityPath>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let removed = submenu_subtree(&mut tx, Some(menu_id), None).await?;
        sqlx::query("DELETE FROM submenus WHERE menu_id = $1")
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(removed)
    }
}
