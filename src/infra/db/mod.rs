//! Postgres-backed repository implementations.

mod catalog;
mod dishes;
mod menus;
mod submenus;
mod sync;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    PgConnection,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::RepoError;
use crate::domain::types::EntityPath;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}

/// Paths of the submenus (and their dishes) matching the optional filters, parents first.
async fn submenu_subtree(
    conn: &mut PgConnection,
    menu_id: Option<&str>,
    submenu_id: Option<&str>,
) -> Result<Vec<EntityPath>, RepoError> {
    let submenus: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT menu_id, id
        FROM submenus
        WHERE ($1::text IS NULL OR menu_id = $1)
          AND ($2::text IS NULL OR id = $2)
        ORDER BY seq
        "#,
    )
    .bind(menu_id)
    .bind(submenu_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let dishes: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT s.menu_id, s.id, d.id
        FROM dishes d
        INNER JOIN submenus s ON s.id = d.submenu_id
        WHERE ($1::text IS NULL OR s.menu_id = $1)
          AND ($2::text IS NULL OR s.id = $2)
        ORDER BY d.seq
        "#,
    )
    .bind(menu_id)
    .bind(submenu_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let mut paths: Vec<EntityPath> = submenus
        .into_iter()
        .map(|(menu_id, submenu_id)| EntityPath::submenu(menu_id, submenu_id))
        .collect();
    paths.extend(
        dishes
            .into_iter()
            .map(|(menu_id, submenu_id, dish_id)| EntityPath::dish(menu_id, submenu_id, dish_id)),
    );
    Ok(paths)
}
