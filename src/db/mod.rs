//! Database layer
//!
//! Storage for tags, startups, news links and posts. Two backends are
//! supported:
//! - SQLite (default, single file next to the binary)
//! - MySQL
//!
//! The driver is selected from configuration and hidden behind the
//! `DatabasePool` trait; repositories pick the concrete pool at call time.
//!
//! # Usage
//!
//! ```ignore
//! use organizer::config::DatabaseConfig;
//! use organizer::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
