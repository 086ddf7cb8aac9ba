//! Tag repository
//!
//! Database operations for tags.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// List all tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Update a tag's name; the slug never changes
    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Delete a tag and its relation rows
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Tags related to a startup, ordered by name
    async fn list_by_startup(&self, startup_id: i64) -> Result<Vec<Tag>>;

    /// Tags related to a post, ordered by name
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_tag_sqlite(self.pool.sqlite()?, tag).await,
            DatabaseDriver::Mysql => create_tag_mysql(self.pool.mysql()?, tag).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_tag_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_tag_by_slug_sqlite(self.pool.sqlite()?, slug).await,
            DatabaseDriver::Mysql => get_tag_by_slug_mysql(self.pool.mysql()?, slug).await,
        }
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_tags_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => list_tags_mysql(self.pool.mysql()?).await,
        }
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_tag_sqlite(self.pool.sqlite()?, tag).await,
            DatabaseDriver::Mysql => update_tag_mysql(self.pool.mysql()?, tag).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_tag_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_tag_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }

    async fn list_by_startup(&self, startup_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_tags_by_startup_sqlite(self.pool.sqlite()?, startup_id).await
            }
            DatabaseDriver::Mysql => {
                list_tags_by_startup_mysql(self.pool.mysql()?, startup_id).await
            }
        }
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_tags_by_post_sqlite(self.pool.sqlite()?, post_id).await,
            DatabaseDriver::Mysql => list_tags_by_post_mysql(self.pool.mysql()?, post_id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(&tag.name)
        .bind(&tag.slug)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    })
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, slug FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    row.as_ref().map(row_to_tag_sqlite).transpose()
}

async fn get_tag_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, slug FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by slug")?;

    row.as_ref().map(row_to_tag_sqlite).transpose()
}

async fn list_tags_sqlite(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, slug FROM tags ORDER BY name, slug")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    rows.iter().map(row_to_tag_sqlite).collect()
}

async fn update_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
        .bind(&tag.name)
        .bind(tag.id)
        .execute(pool)
        .await
        .context("Failed to update tag")?;

    get_tag_by_id_sqlite(pool, tag.id)
        .await?
        .context("Tag not found after update")
}

async fn delete_tag_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // Relation rows go with it through ON DELETE CASCADE.
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(())
}

async fn list_tags_by_startup_sqlite(pool: &SqlitePool, startup_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug
        FROM tags t
        INNER JOIN startup_tags st ON t.id = st.tag_id
        WHERE st.startup_id = ?
        ORDER BY t.name, t.slug
        "#,
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for startup")?;

    rows.iter().map(row_to_tag_sqlite).collect()
}

async fn list_tags_by_post_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug
        FROM tags t
        INNER JOIN post_tags pt ON t.id = pt.tag_id
        WHERE pt.post_id = ?
        ORDER BY t.name, t.slug
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for post")?;

    rows.iter().map(row_to_tag_sqlite).collect()
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(&tag.name)
        .bind(&tag.slug)
        .execute(pool)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    })
}

async fn get_tag_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, slug FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    row.as_ref().map(row_to_tag_mysql).transpose()
}

async fn get_tag_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, slug FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by slug")?;

    row.as_ref().map(row_to_tag_mysql).transpose()
}

async fn list_tags_mysql(pool: &MySqlPool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, slug FROM tags ORDER BY name, slug")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    rows.iter().map(row_to_tag_mysql).collect()
}

async fn update_tag_mysql(pool: &MySqlPool, tag: &Tag) -> Result<Tag> {
    sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
        .bind(&tag.name)
        .bind(tag.id)
        .execute(pool)
        .await
        .context("Failed to update tag")?;

    get_tag_by_id_mysql(pool, tag.id)
        .await?
        .context("Tag not found after update")
}

async fn delete_tag_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(())
}

async fn list_tags_by_startup_mysql(pool: &MySqlPool, startup_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug
        FROM tags t
        INNER JOIN startup_tags st ON t.id = st.tag_id
        WHERE st.startup_id = ?
        ORDER BY t.name, t.slug
        "#,
    )
    .bind(startup_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for startup")?;

    rows.iter().map(row_to_tag_mysql).collect()
}

async fn list_tags_by_post_mysql(pool: &MySqlPool, post_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.slug
        FROM tags t
        INNER JOIN post_tags pt ON t.id = pt.tag_id
        WHERE pt.post_id = ?
        ORDER BY t.name, t.slug
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for post")?;

    rows.iter().map(row_to_tag_mysql).collect()
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxTagRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTagRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_tag(name: &str, slug: &str) -> Tag {
        Tag::new(name.to_string(), slug.to_string())
    }

    async fn create_test_startup(pool: &SqlitePool, slug: &str) -> i64 {
        sqlx::query(
            "INSERT INTO startups (name, slug, description, founded_date, website) \
             VALUES (?, ?, 'desc', '2015-06-01', 'https://example.com')",
        )
        .bind(slug)
        .bind(slug)
        .execute(pool)
        .await
        .expect("Failed to create test startup")
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_tag() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_tag("Rust", "rust"))
            .await
            .expect("Failed to create tag");

        assert!(created.id > 0);
        assert_eq!(created.name, "Rust");
        assert_eq!(created.slug, "rust");
    }

    #[tokio::test]
    async fn test_create_duplicate_slug_fails() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_tag("AI", "ai")).await.unwrap();

        let result = repo.create(&create_test_tag("AI", "ai")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_by_id_and_slug() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&create_test_tag("Rust", "rust")).await.unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap();
        let by_slug = repo.get_by_slug("rust").await.unwrap();

        assert_eq!(by_id, Some(created.clone()));
        assert_eq!(by_slug, Some(created));
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_tag("Web", "web")).await.unwrap();
        repo.create(&create_test_tag("AI", "ai")).await.unwrap();
        repo.create(&create_test_tag("Mobile", "mobile")).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|t| t.name).collect();

        assert_eq!(names, vec!["AI", "Mobile", "Web"]);
    }

    #[tokio::test]
    async fn test_update_keeps_slug() {
        let (_pool, repo) = setup_test_repo().await;
        let mut tag = repo.create(&create_test_tag("AI", "ai")).await.unwrap();

        tag.name = "Artificial Intelligence".to_string();
        tag.slug = "ignored".to_string();
        let updated = repo.update(&tag).await.unwrap();

        assert_eq!(updated.name, "Artificial Intelligence");
        assert_eq!(updated.slug, "ai");
    }

    #[tokio::test]
    async fn test_exists_by_slug() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_tag("AI", "ai")).await.unwrap();

        assert!(repo.exists_by_slug("ai").await.unwrap());
        assert!(!repo.exists_by_slug("ai-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_relations() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite_pool = pool.sqlite().unwrap();
        let tag = repo.create(&create_test_tag("AI", "ai")).await.unwrap();
        let startup_id = create_test_startup(sqlite_pool, "acme").await;
        sqlx::query("INSERT INTO startup_tags (startup_id, tag_id) VALUES (?, ?)")
            .bind(startup_id)
            .bind(tag.id)
            .execute(sqlite_pool)
            .await
            .unwrap();

        repo.delete(tag.id).await.expect("Failed to delete tag");

        assert!(repo.get_by_id(tag.id).await.unwrap().is_none());
        assert!(repo.list_by_startup(startup_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_startup_and_post() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite_pool = pool.sqlite().unwrap();
        let web = repo.create(&create_test_tag("Web", "web")).await.unwrap();
        let ai = repo.create(&create_test_tag("AI", "ai")).await.unwrap();
        repo.create(&create_test_tag("Unused", "unused")).await.unwrap();

        let startup_id = create_test_startup(sqlite_pool, "acme").await;
        for tag_id in [web.id, ai.id] {
            sqlx::query("INSERT INTO startup_tags (startup_id, tag_id) VALUES (?, ?)")
                .bind(startup_id)
                .bind(tag_id)
                .execute(sqlite_pool)
                .await
                .unwrap();
        }
        let post_id = sqlx::query(
            "INSERT INTO posts (title, slug, text, pub_date) VALUES ('P', 'p', 't', '2020-01-01')",
        )
        .execute(sqlite_pool)
        .await
        .unwrap()
        .last_insert_rowid();
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(web.id)
            .execute(sqlite_pool)
            .await
            .unwrap();

        let startup_tags = repo.list_by_startup(startup_id).await.unwrap();
        let post_tags = repo.list_by_post(post_id).await.unwrap();

        assert_eq!(startup_tags, vec![ai, web.clone()]);
        assert_eq!(post_tags, vec![web]);
    }
}
