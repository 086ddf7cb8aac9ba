//! Database migrations
//!
//! Code-based migrations embedded in the binary as SQL strings, with one
//! variant per supported backend.
//!
//! # Usage
//!
//! ```ignore
//! use organizer::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(31) NOT NULL,
                slug VARCHAR(31) NOT NULL UNIQUE
            );
            CREATE INDEX IF NOT EXISTS idx_tags_name ON tags(name);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(31) NOT NULL,
                slug VARCHAR(31) NOT NULL UNIQUE
            );
            CREATE INDEX idx_tags_name ON tags(name);
        "#,
    },
    Migration {
        version: 2,
        name: "create_startups",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS startups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(31) NOT NULL,
                slug VARCHAR(31) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                founded_date DATE NOT NULL,
                website VARCHAR(255) NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_startups_name ON startups(name);
            CREATE TABLE IF NOT EXISTS startup_tags (
                startup_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (startup_id, tag_id),
                FOREIGN KEY (startup_id) REFERENCES startups(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_startup_tags_tag_id ON startup_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS startups (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(31) NOT NULL,
                slug VARCHAR(31) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                founded_date DATE NOT NULL,
                website VARCHAR(255) NOT NULL
            );
            CREATE INDEX idx_startups_name ON startups(name);
            CREATE TABLE IF NOT EXISTS startup_tags (
                startup_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (startup_id, tag_id),
                FOREIGN KEY (startup_id) REFERENCES startups(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_startup_tags_tag_id ON startup_tags(tag_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_newslinks",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newslinks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(63) NOT NULL,
                slug VARCHAR(63) NOT NULL,
                pub_date DATE NOT NULL,
                link VARCHAR(255) NOT NULL,
                startup_id INTEGER NOT NULL,
                UNIQUE (startup_id, slug),
                FOREIGN KEY (startup_id) REFERENCES startups(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_newslinks_pub_date ON newslinks(pub_date);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS newslinks (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(63) NOT NULL,
                slug VARCHAR(63) NOT NULL,
                pub_date DATE NOT NULL,
                link VARCHAR(255) NOT NULL,
                startup_id BIGINT NOT NULL,
                UNIQUE (startup_id, slug),
                FOREIGN KEY (startup_id) REFERENCES startups(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_newslinks_pub_date ON newslinks(pub_date);
        "#,
    },
    Migration {
        version: 4,
        name: "create_posts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(63) NOT NULL,
                slug VARCHAR(63) NOT NULL UNIQUE,
                text TEXT NOT NULL,
                pub_date DATE NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts(pub_date);
            CREATE TABLE IF NOT EXISTS post_tags (
                post_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (post_id, tag_id),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_post_tags_tag_id ON post_tags(tag_id);
            CREATE TABLE IF NOT EXISTS post_startups (
                post_id INTEGER NOT NULL,
                startup_id INTEGER NOT NULL,
                PRIMARY KEY (post_id, startup_id),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (startup_id) REFERENCES startups(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_post_startups_startup_id ON post_startups(startup_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(63) NOT NULL,
                slug VARCHAR(63) NOT NULL UNIQUE,
                text TEXT NOT NULL,
                pub_date DATE NOT NULL
            );
            CREATE INDEX idx_posts_pub_date ON posts(pub_date);
            CREATE TABLE IF NOT EXISTS post_tags (
                post_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                PRIMARY KEY (post_id, tag_id),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_post_tags_tag_id ON post_tags(tag_id);
            CREATE TABLE IF NOT EXISTS post_startups (
                post_id BIGINT NOT NULL,
                startup_id BIGINT NOT NULL,
                PRIMARY KEY (post_id, startup_id),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (startup_id) REFERENCES startups(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_post_startups_startup_id ON post_startups(startup_id);
        "#,
    },
];

/// Run all pending migrations
///
/// # Returns
///
/// Number of migrations applied
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied_versions.contains(&i64::from(migration.version)) {
            continue;
        }
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.name
        );
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    match pool.driver() {
        DatabaseDriver::Sqlite => {
            sqlx::query(sql).execute(pool.sqlite()?).await?;
        }
        DatabaseDriver::Mysql => {
            sqlx::query(sql).execute(pool.mysql()?).await?;
        }
    }
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.sqlite()?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.mysql()?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.sqlite()?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.mysql()?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

// MySQL commits DDL implicitly, so statements run one by one on the pool.
async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a migration body into individual statements.
///
/// Migration bodies never contain `;` inside literals, so a plain split is
/// enough; comment-only fragments are dropped.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .filter(|stmt| {
            stmt.lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with("--"))
        })
        .collect()
}
