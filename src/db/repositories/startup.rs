//! Startup repository
//!
//! Database operations for startups and their tag relations.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Startup;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Startup repository trait
#[async_trait]
pub trait StartupRepository: Send + Sync {
    /// Insert a startup together with its tag relations
    async fn create(&self, startup: &Startup, tag_ids: &[i64]) -> Result<Startup>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Startup>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Startup>>;

    /// List all startups ordered by name
    async fn list(&self) -> Result<Vec<Startup>>;

    /// Most recently founded startup
    async fn latest(&self) -> Result<Option<Startup>>;

    /// Update fields (slug excluded) and replace the tag relations
    async fn update(&self, startup: &Startup, tag_ids: &[i64]) -> Result<Startup>;

    /// Delete a startup; its news links and relation rows cascade
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Startups carrying a tag, ordered by name
    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Startup>>;

    /// Startups referenced by a post, ordered by name
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Startup>>;
}

/// SQLx-based startup repository implementation
pub struct SqlxStartupRepository {
    pool: DynDatabasePool,
}

impl SqlxStartupRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StartupRepository> {
        Arc::new(Self::new(pool))
    }
}

const STARTUP_COLUMNS: &str = "s.id, s.name, s.slug, s.description, s.founded_date, s.website";

#[async_trait]
impl StartupRepository for SqlxStartupRepository {
    async fn create(&self, startup: &Startup, tag_ids: &[i64]) -> Result<Startup> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_startup_sqlite(self.pool.sqlite()?, startup, tag_ids).await
            }
            DatabaseDriver::Mysql => {
                create_startup_mysql(self.pool.mysql()?, startup, tag_ids).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Startup>> {
        let sql = format!("SELECT {} FROM startups s WHERE s.id = ?", STARTUP_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_one_sqlite(self.pool.sqlite()?, &sql, id).await,
            DatabaseDriver::Mysql => fetch_one_mysql(self.pool.mysql()?, &sql, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Startup>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_startup_by_slug_sqlite(self.pool.sqlite()?, slug).await,
            DatabaseDriver::Mysql => get_startup_by_slug_mysql(self.pool.mysql()?, slug).await,
        }
    }

    async fn list(&self) -> Result<Vec<Startup>> {
        let sql = format!(
            "SELECT {} FROM startups s ORDER BY s.name, s.slug",
            STARTUP_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_all_sqlite(self.pool.sqlite()?, &sql, None).await,
            DatabaseDriver::Mysql => fetch_all_mysql(self.pool.mysql()?, &sql, None).await,
        }
    }

    async fn latest(&self) -> Result<Option<Startup>> {
        let sql = format!(
            "SELECT {} FROM startups s ORDER BY s.founded_date DESC, s.id DESC LIMIT 1",
            STARTUP_COLUMNS
        );
        let startups = match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_all_sqlite(self.pool.sqlite()?, &sql, None).await?,
            DatabaseDriver::Mysql => fetch_all_mysql(self.pool.mysql()?, &sql, None).await?,
        };
        Ok(startups.into_iter().next())
    }

    async fn update(&self, startup: &Startup, tag_ids: &[i64]) -> Result<Startup> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_startup_sqlite(self.pool.sqlite()?, startup, tag_ids).await?
            }
            DatabaseDriver::Mysql => {
                update_startup_mysql(self.pool.mysql()?, startup, tag_ids).await?
            }
        }
        self.get_by_id(startup.id)
            .await?
            .context("Startup not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM startups WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete startup")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM startups WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete startup")?;
            }
        }
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }

    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Startup>> {
        let sql = format!(
            "SELECT {} FROM startups s \
             INNER JOIN startup_tags st ON s.id = st.startup_id \
             WHERE st.tag_id = ? ORDER BY s.name, s.slug",
            STARTUP_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_all_sqlite(self.pool.sqlite()?, &sql, Some(tag_id)).await,
            DatabaseDriver::Mysql => fetch_all_mysql(self.pool.mysql()?, &sql, Some(tag_id)).await,
        }
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Startup>> {
        let sql = format!(
            "SELECT {} FROM startups s \
             INNER JOIN post_startups ps ON s.id = ps.startup_id \
             WHERE ps.post_id = ? ORDER BY s.name, s.slug",
            STARTUP_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_all_sqlite(self.pool.sqlite()?, &sql, Some(post_id)).await
            }
            DatabaseDriver::Mysql => fetch_all_mysql(self.pool.mysql()?, &sql, Some(post_id)).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_startup_sqlite(
    pool: &SqlitePool,
    startup: &Startup,
    tag_ids: &[i64],
) -> Result<Startup> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO startups (name, slug, description, founded_date, website)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&startup.name)
    .bind(&startup.slug)
    .bind(&startup.description)
    .bind(startup.founded_date)
    .bind(&startup.website)
    .execute(&mut *tx)
    .await
    .context("Failed to create startup")?;
    let id = result.last_insert_rowid();

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO startup_tags (startup_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to startup")?;
    }

    tx.commit().await?;

    Ok(Startup {
        id,
        ..startup.clone()
    })
}

async fn get_startup_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Startup>> {
    let sql = format!("SELECT {} FROM startups s WHERE s.slug = ?", STARTUP_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get startup by slug")?;

    row.as_ref().map(row_to_startup_sqlite).transpose()
}

async fn fetch_one_sqlite(pool: &SqlitePool, sql: &str, id: i64) -> Result<Option<Startup>> {
    let row = sqlx::query(sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get startup")?;

    row.as_ref().map(row_to_startup_sqlite).transpose()
}

async fn fetch_all_sqlite(pool: &SqlitePool, sql: &str, param: Option<i64>) -> Result<Vec<Startup>> {
    let mut query = sqlx::query(sql);
    if let Some(param) = param {
        query = query.bind(param);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list startups")?;

    rows.iter().map(row_to_startup_sqlite).collect()
}

async fn update_startup_sqlite(pool: &SqlitePool, startup: &Startup, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE startups
        SET name = ?, description = ?, founded_date = ?, website = ?
        WHERE id = ?
        "#,
    )
    .bind(&startup.name)
    .bind(&startup.description)
    .bind(startup.founded_date)
    .bind(&startup.website)
    .bind(startup.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update startup")?;

    sqlx::query("DELETE FROM startup_tags WHERE startup_id = ?")
        .bind(startup.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear startup tags")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO startup_tags (startup_id, tag_id) VALUES (?, ?)")
            .bind(startup.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to startup")?;
    }

    tx.commit().await?;
    Ok(())
}

fn row_to_startup_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Startup> {
    Ok(Startup {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        founded_date: row.try_get("founded_date")?,
        website: row.try_get("website")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_startup_mysql(
    pool: &MySqlPool,
    startup: &Startup,
    tag_ids: &[i64],
) -> Result<Startup> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO startups (name, slug, description, founded_date, website)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&startup.name)
    .bind(&startup.slug)
    .bind(&startup.description)
    .bind(startup.founded_date)
    .bind(&startup.website)
    .execute(&mut *tx)
    .await
    .context("Failed to create startup")?;
    let id = result.last_insert_id() as i64;

    for tag_id in tag_ids {
        sqlx::query("INSERT IGNORE INTO startup_tags (startup_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to startup")?;
    }

    tx.commit().await?;

    Ok(Startup {
        id,
        ..startup.clone()
    })
}

async fn get_startup_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Startup>> {
    let sql = format!("SELECT {} FROM startups s WHERE s.slug = ?", STARTUP_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get startup by slug")?;

    row.as_ref().map(row_to_startup_mysql).transpose()
}

async fn fetch_one_mysql(pool: &MySqlPool, sql: &str, id: i64) -> Result<Option<Startup>> {
    let row = sqlx::query(sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get startup")?;

    row.as_ref().map(row_to_startup_mysql).transpose()
}

async fn fetch_all_mysql(pool: &MySqlPool, sql: &str, param: Option<i64>) -> Result<Vec<Startup>> {
    let mut query = sqlx::query(sql);
    if let Some(param) = param {
        query = query.bind(param);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list startups")?;

    rows.iter().map(row_to_startup_mysql).collect()
}

async fn update_startup_mysql(pool: &MySqlPool, startup: &Startup, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE startups
        SET name = ?, description = ?, founded_date = ?, website = ?
        WHERE id = ?
        "#,
    )
    .bind(&startup.name)
    .bind(&startup.description)
    .bind(startup.founded_date)
    .bind(&startup.website)
    .bind(startup.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update startup")?;

    sqlx::query("DELETE FROM startup_tags WHERE startup_id = ?")
        .bind(startup.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear startup tags")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT IGNORE INTO startup_tags (startup_id, tag_id) VALUES (?, ?)")
            .bind(startup.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to startup")?;
    }

    tx.commit().await?;
    Ok(())
}

fn row_to_startup_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Startup> {
    Ok(Startup {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        founded_date: row.try_get("founded_date")?,
        website: row.try_get("website")?,
    })
}
