//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod newslink;
pub mod post;
pub mod startup;
pub mod tag;

pub use newslink::{NewsLinkRepository, SqlxNewsLinkRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use startup::{SqlxStartupRepository, StartupRepository};
pub use tag::{SqlxTagRepository, TagRepository};
