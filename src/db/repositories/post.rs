//! Post repository
//!
//! Database operations for blog posts and their tag/startup relations.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Post;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post together with its tag and startup relations
    async fn create(&self, post: &Post, tag_ids: &[i64], startup_ids: &[i64]) -> Result<Post>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// All posts, newest first, then by title
    async fn list(&self) -> Result<Vec<Post>>;

    /// Most recently published post
    async fn latest(&self) -> Result<Option<Post>>;

    /// Update fields (slug excluded) and replace both relation sets
    async fn update(&self, post: &Post, tag_ids: &[i64], startup_ids: &[i64]) -> Result<Post>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Posts carrying a tag, newest first
    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Post>>;

    /// Posts referencing a startup, newest first
    async fn list_by_startup(&self, startup_id: i64) -> Result<Vec<Post>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch(&self, sql: &str, param: Option<i64>) -> Result<Vec<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_posts_sqlite(self.pool.sqlite()?, sql, param).await,
            DatabaseDriver::Mysql => fetch_posts_mysql(self.pool.mysql()?, sql, param).await,
        }
    }
}

const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.text, p.pub_date";
const POST_ORDER: &str = "ORDER BY p.pub_date DESC, p.title ASC";

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post, tag_ids: &[i64], startup_ids: &[i64]) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_post_sqlite(self.pool.sqlite()?, post, tag_ids, startup_ids).await
            }
            DatabaseDriver::Mysql => {
                create_post_mysql(self.pool.mysql()?, post, tag_ids, startup_ids).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS);
        Ok(self.fetch(&sql, Some(id)).await?.into_iter().next())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.slug = ?", POST_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get post by slug")?;
                row.as_ref().map(row_to_post_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get post by slug")?;
                row.as_ref().map(row_to_post_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Post>> {
        let sql = format!("SELECT {} FROM posts p {}", POST_COLUMNS, POST_ORDER);
        self.fetch(&sql, None).await
    }

    async fn latest(&self) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p {} LIMIT 1", POST_COLUMNS, POST_ORDER);
        Ok(self.fetch(&sql, None).await?.into_iter().next())
    }

    async fn update(&self, post: &Post, tag_ids: &[i64], startup_ids: &[i64]) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_post_sqlite(self.pool.sqlite()?, post, tag_ids, startup_ids).await?
            }
            DatabaseDriver::Mysql => {
                update_post_mysql(self.pool.mysql()?, post, tag_ids, startup_ids).await?
            }
        }
        self.get_by_id(post.id)
            .await?
            .context("Post not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM posts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete post")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM posts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete post")?;
            }
        }
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }

    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts p INNER JOIN post_tags pt ON p.id = pt.post_id \
             WHERE pt.tag_id = ? {}",
            POST_COLUMNS, POST_ORDER
        );
        self.fetch(&sql, Some(tag_id)).await
    }

    async fn list_by_startup(&self, startup_id: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts p INNER JOIN post_startups ps ON p.id = ps.post_id \
             WHERE ps.startup_id = ? {}",
            POST_COLUMNS, POST_ORDER
        );
        self.fetch(&sql, Some(startup_id)).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(
    pool: &SqlitePool,
    post: &Post,
    tag_ids: &[i64],
    startup_ids: &[i64],
) -> Result<Post> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("INSERT INTO posts (title, slug, text, pub_date) VALUES (?, ?, ?, ?)")
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.text)
        .bind(post.pub_date)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?;
    let id = result.last_insert_rowid();

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to post")?;
    }
    for startup_id in startup_ids {
        sqlx::query("INSERT OR IGNORE INTO post_startups (post_id, startup_id) VALUES (?, ?)")
            .bind(id)
            .bind(startup_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate startup to post")?;
    }

    tx.commit().await?;

    Ok(Post {
        id,
        ..post.clone()
    })
}

async fn update_post_sqlite(
    pool: &SqlitePool,
    post: &Post,
    tag_ids: &[i64],
    startup_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE posts SET title = ?, text = ?, pub_date = ? WHERE id = ?")
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update post")?;

    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post tags")?;
    sqlx::query("DELETE FROM post_startups WHERE post_id = ?")
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post startups")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to post")?;
    }
    for startup_id in startup_ids {
        sqlx::query("INSERT OR IGNORE INTO post_startups (post_id, startup_id) VALUES (?, ?)")
            .bind(post.id)
            .bind(startup_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate startup to post")?;
    }

    tx.commit().await?;
    Ok(())
}

async fn fetch_posts_sqlite(pool: &SqlitePool, sql: &str, param: Option<i64>) -> Result<Vec<Post>> {
    let mut query = sqlx::query(sql);
    if let Some(param) = param {
        query = query.bind(param);
    }
    let rows = query.fetch_all(pool).await.context("Failed to query posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(
    pool: &MySqlPool,
    post: &Post,
    tag_ids: &[i64],
    startup_ids: &[i64],
) -> Result<Post> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("INSERT INTO posts (title, slug, text, pub_date) VALUES (?, ?, ?, ?)")
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.text)
        .bind(post.pub_date)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?;
    let id = result.last_insert_id() as i64;

    for tag_id in tag_ids {
        sqlx::query("INSERT IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to post")?;
    }
    for startup_id in startup_ids {
        sqlx::query("INSERT IGNORE INTO post_startups (post_id, startup_id) VALUES (?, ?)")
            .bind(id)
            .bind(startup_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate startup to post")?;
    }

    tx.commit().await?;

    Ok(Post {
        id,
        ..post.clone()
    })
}

async fn update_post_mysql(
    pool: &MySqlPool,
    post: &Post,
    tag_ids: &[i64],
    startup_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE posts SET title = ?, text = ?, pub_date = ? WHERE id = ?")
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update post")?;

    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post tags")?;
    sqlx::query("DELETE FROM post_startups WHERE post_id = ?")
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post startups")?;

    for tag_id in tag_ids {
        sqlx::query("INSERT IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate tag to post")?;
    }
    for startup_id in startup_ids {
        sqlx::query("INSERT IGNORE INTO post_startups (post_id, startup_id) VALUES (?, ?)")
            .bind(post.id)
            .bind(startup_id)
            .execute(&mut *tx)
            .await
            .context("Failed to relate startup to post")?;
    }

    tx.commit().await?;
    Ok(())
}

async fn fetch_posts_mysql(pool: &MySqlPool, sql: &str, param: Option<i64>) -> Result<Vec<Post>> {
    let mut query = sqlx::query(sql);
    if let Some(param) = param {
        query = query.bind(param);
    }
    let rows = query.fetch_all(pool).await.context("Failed to query posts")?;

    rows.iter().map(row_to_post_mysql).collect()
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
    })
}
