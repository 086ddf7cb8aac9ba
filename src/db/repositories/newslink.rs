//! News link repository
//!
//! Every query joins the parent startup so links come back with the
//! startup's slug and name filled in.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::NewsLink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// News link repository trait
#[async_trait]
pub trait NewsLinkRepository: Send + Sync {
    /// Insert a news link; `startup_slug`/`startup_name` on the input are ignored
    async fn create(&self, link: &NewsLink) -> Result<NewsLink>;

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsLink>>;

    /// Look up a link by its slug within one startup
    async fn get_by_slug(&self, startup_id: i64, slug: &str) -> Result<Option<NewsLink>>;

    /// A startup's links, newest first
    async fn list_by_startup(&self, startup_id: i64) -> Result<Vec<NewsLink>>;

    /// Most recently published link across all startups
    async fn latest(&self) -> Result<Option<NewsLink>>;

    /// Update title, date, link and parent; the slug never changes
    async fn update(&self, link: &NewsLink) -> Result<NewsLink>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug is taken within one startup
    async fn exists_by_slug(&self, startup_id: i64, slug: &str) -> Result<bool>;
}

/// SQLx-based news link repository implementation
pub struct SqlxNewsLinkRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsLinkRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsLinkRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_NEWSLINK: &str = r#"
    SELECT n.id, n.title, n.slug, n.pub_date, n.link, n.startup_id,
           s.slug AS startup_slug, s.name AS startup_name
    FROM newslinks n
    INNER JOIN startups s ON s.id = n.startup_id
"#;

#[async_trait]
impl NewsLinkRepository for SqlxNewsLinkRepository {
    async fn create(&self, link: &NewsLink) -> Result<NewsLink> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_newslink_sqlite(self.pool.sqlite()?, link).await?,
            DatabaseDriver::Mysql => create_newslink_mysql(self.pool.mysql()?, link).await?,
        };
        self.get_by_id(id)
            .await?
            .context("News link not found after insert")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsLink>> {
        let sql = format!("{} WHERE n.id = ?", SELECT_NEWSLINK);
        let links = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_newslinks_sqlite(self.pool.sqlite()?, &sql, &[id], None).await?
            }
            DatabaseDriver::Mysql => {
                fetch_newslinks_mysql(self.pool.mysql()?, &sql, &[id], None).await?
            }
        };
        Ok(links.into_iter().next())
    }

    async fn get_by_slug(&self, startup_id: i64, slug: &str) -> Result<Option<NewsLink>> {
        let sql = format!("{} WHERE n.startup_id = ? AND n.slug = ?", SELECT_NEWSLINK);
        let links = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_newslinks_sqlite(self.pool.sqlite()?, &sql, &[startup_id], Some(slug)).await?
            }
            DatabaseDriver::Mysql => {
                fetch_newslinks_mysql(self.pool.mysql()?, &sql, &[startup_id], Some(slug)).await?
            }
        };
        Ok(links.into_iter().next())
    }

    async fn list_by_startup(&self, startup_id: i64) -> Result<Vec<NewsLink>> {
        let sql = format!(
            "{} WHERE n.startup_id = ? ORDER BY n.pub_date DESC, n.title",
            SELECT_NEWSLINK
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_newslinks_sqlite(self.pool.sqlite()?, &sql, &[startup_id], None).await
            }
            DatabaseDriver::Mysql => {
                fetch_newslinks_mysql(self.pool.mysql()?, &sql, &[startup_id], None).await
            }
        }
    }

    async fn latest(&self) -> Result<Option<NewsLink>> {
        let sql = format!("{} ORDER BY n.pub_date DESC, n.id DESC LIMIT 1", SELECT_NEWSLINK);
        let links = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                fetch_newslinks_sqlite(self.pool.sqlite()?, &sql, &[], None).await?
            }
            DatabaseDriver::Mysql => fetch_newslinks_mysql(self.pool.mysql()?, &sql, &[], None).await?,
        };
        Ok(links.into_iter().next())
    }

    async fn update(&self, link: &NewsLink) -> Result<NewsLink> {
        let sql = "UPDATE newslinks SET title = ?, pub_date = ?, link = ?, startup_id = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&link.title)
                    .bind(link.pub_date)
                    .bind(&link.link)
                    .bind(link.startup_id)
                    .bind(link.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update news link")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&link.title)
                    .bind(link.pub_date)
                    .bind(&link.link)
                    .bind(link.startup_id)
                    .bind(link.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update news link")?;
            }
        }
        self.get_by_id(link.id)
            .await?
            .context("News link not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM newslinks WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete news link")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM newslinks WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete news link")?;
            }
        }
        Ok(())
    }

    async fn exists_by_slug(&self, startup_id: i64, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(startup_id, slug).await?.is_some())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_newslink_sqlite(pool: &SqlitePool, link: &NewsLink) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO newslinks (title, slug, pub_date, link, startup_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&link.title)
    .bind(&link.slug)
    .bind(link.pub_date)
    .bind(&link.link)
    .bind(link.startup_id)
    .execute(pool)
    .await
    .context("Failed to create news link")?;

    Ok(result.last_insert_rowid())
}

/// Run a news link select binding the integer params, then an optional slug.
async fn fetch_newslinks_sqlite(
    pool: &SqlitePool,
    sql: &str,
    ids: &[i64],
    slug: Option<&str>,
) -> Result<Vec<NewsLink>> {
    let mut query = sqlx::query(sql);
    for id in ids {
        query = query.bind(*id);
    }
    if let Some(slug) = slug {
        query = query.bind(slug);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query news links")?;

    rows.iter().map(row_to_newslink_sqlite).collect()
}

fn row_to_newslink_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<NewsLink> {
    Ok(NewsLink {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        pub_date: row.try_get("pub_date")?,
        link: row.try_get("link")?,
        startup_id: row.try_get("startup_id")?,
        startup_slug: row.try_get("startup_slug")?,
        startup_name: row.try_get("startup_name")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_newslink_mysql(pool: &MySqlPool, link: &NewsLink) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO newslinks (title, slug, pub_date, link, startup_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&link.title)
    .bind(&link.slug)
    .bind(link.pub_date)
    .bind(&link.link)
    .bind(link.startup_id)
    .execute(pool)
    .await
    .context("Failed to create news link")?;

    Ok(result.last_insert_id() as i64)
}

async fn fetch_newslinks_mysql(
    pool: &MySqlPool,
    sql: &str,
    ids: &[i64],
    slug: Option<&str>,
) -> Result<Vec<NewsLink>> {
    let mut query = sqlx::query(sql);
    for id in ids {
        query = query.bind(*id);
    }
    if let Some(slug) = slug {
        query = query.bind(slug);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query news links")?;

    rows.iter().map(row_to_newslink_mysql).collect()
}

fn row_to_newslink_mysql(row: &sqlx::mysql::MySqlRow) -> Result<NewsLink> {
    Ok(NewsLink {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        pub_date: row.try_get("pub_date")?,
        link: row.try_get("link")?,
        startup_id: row.try_get("startup_id")?,
        startup_slug: row.try_get("startup_slug")?,
        startup_name: row.try_get("startup_name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxStartupRepository, StartupRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Startup, StartupInput};
    use chrono::NaiveDate;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxNewsLinkRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxNewsLinkRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_startup(pool: &DynDatabasePool, name: &str, slug: &str) -> Startup {
        let input = StartupInput {
            name: name.to_string(),
            description: "desc".to_string(),
            founded_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            website: "https://example.com".to_string(),
            tag_ids: vec![],
        };
        SqlxStartupRepository::new(pool.clone())
            .create(&Startup::new(&input, slug.to_string()), &[])
            .await
            .expect("Failed to create startup")
    }

    fn new_link(startup: &Startup, title: &str, slug: &str, date: (i32, u32, u32)) -> NewsLink {
        NewsLink {
            id: 0,
            title: title.to_string(),
            slug: slug.to_string(),
            pub_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            link: format!("https://news.example.com/{}", slug),
            startup_id: startup.id,
            startup_slug: String::new(),
            startup_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_fills_startup_fields() {
        let (pool, repo) = setup_test_repo().await;
        let acme = create_startup(&pool, "Acme", "acme").await;

        let created = repo
            .create(&new_link(&acme, "Launch", "launch", (2020, 1, 2)))
            .await
            .expect("Failed to create news link");

        assert!(created.id > 0);
        assert_eq!(created.startup_slug, "acme");
        assert_eq!(created.startup_name, "Acme");
        assert_eq!(created.to_string(), "Acme: Launch");
    }

    #[tokio::test]
    async fn test_get_by_slug_is_scoped_to_startup() {
        let (pool, repo) = setup_test_repo().await;
        let acme = create_startup(&pool, "Acme", "acme").await;
        let globex = create_startup(&pool, "Globex", "globex").await;
        repo.create(&new_link(&acme, "Launch", "launch", (2020, 1, 2)))
            .await
            .unwrap();

        assert!(repo.get_by_slug(acme.id, "launch").await.unwrap().is_some());
        assert!(repo.get_by_slug(globex.id, "launch").await.unwrap().is_none());
        assert!(repo.exists_by_slug(acme.id, "launch").await.unwrap());
        assert!(!repo.exists_by_slug(globex.id, "launch").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_startup_newest_first() {
        let (pool, repo) = setup_test_repo().await;
        let acme = create_startup(&pool, "Acme", "acme").await;
        let other = create_startup(&pool, "Other", "other").await;
        repo.create(&new_link(&acme, "Old", "old", (2018, 1, 1))).await.unwrap();
        repo.create(&new_link(&acme, "New", "new", (2021, 6, 1))).await.unwrap();
        repo.create(&new_link(&acme, "Mid", "mid", (2019, 3, 1))).await.unwrap();
        repo.create(&new_link(&other, "Elsewhere", "elsewhere", (2022, 1, 1)))
            .await
            .unwrap();

        let slugs: Vec<String> = repo
            .list_by_startup(acme.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.slug)
            .collect();
        let latest = repo.latest().await.unwrap().expect("latest");

        assert_eq!(slugs, vec!["new", "mid", "old"]);
        assert_eq!(latest.slug, "elsewhere");
    }

    #[tokio::test]
    async fn test_update_can_move_to_other_startup() {
        let (pool, repo) = setup_test_repo().await;
        let acme = create_startup(&pool, "Acme", "acme").await;
        let globex = create_startup(&pool, "Globex", "globex").await;
        let mut link = repo
            .create(&new_link(&acme, "Launch", "launch", (2020, 1, 2)))
            .await
            .unwrap();

        link.title = "Relaunch".to_string();
        link.startup_id = globex.id;
        let updated = repo.update(&link).await.unwrap();

        assert_eq!(updated.title, "Relaunch");
        assert_eq!(updated.slug, "launch");
        assert_eq!(updated.startup_slug, "globex");
    }

    #[tokio::test]
    async fn test_startup_delete_cascades() {
        let (pool, repo) = setup_test_repo().await;
        let acme = create_startup(&pool, "Acme", "acme").await;
        let link = repo
            .create(&new_link(&acme, "Launch", "launch", (2020, 1, 2)))
            .await
            .unwrap();

        SqlxStartupRepository::new(pool.clone())
            .delete(acme.id)
            .await
            .unwrap();

        assert!(repo.get_by_id(link.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, repo) = setup_test_repo().await;
        let acme = create_startup(&pool, "Acme", "acme").await;
        let link = repo
            .create(&new_link(&acme, "Launch", "launch", (2020, 1, 2)))
            .await
            .unwrap();

        repo.delete(link.id).await.unwrap();

        assert!(repo.list_by_startup(acme.id).await.unwrap().is_empty());
    }
}
