//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They are
//! responsible for:
//! - Assigning unique slugs on creation
//! - Checking that referenced tags and startups exist
//! - Translating storage failures into [`ServiceError`]

pub mod newslink;
pub mod post;
pub mod slug;
pub mod startup;
pub mod tag;

pub use newslink::NewsLinkService;
pub use post::{PostDetail, PostService};
pub use startup::{StartupDetail, StartupService};
pub use tag::{TagDetail, TagService};

use crate::db::repositories::{StartupRepository, TagRepository};
use crate::forms::{fields, FormErrors};

/// Error type shared by every service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The identifier does not resolve to a stored entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// Submitted values were rejected; nothing was written
    #[error("Validation error: {0}")]
    Validation(FormErrors),

    /// A uniqueness constraint failed in storage
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Any other storage failure
    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        let unique_violation = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<sqlx::Error>(),
                Some(sqlx::Error::Database(db)) if db.is_unique_violation()
            )
        });

        if unique_violation {
            ServiceError::IntegrityViolation(format!("{:#}", err))
        } else {
            ServiceError::Internal(err)
        }
    }
}

impl From<FormErrors> for ServiceError {
    fn from(errors: FormErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

/// Flag every id in `ids` that names no stored tag
pub(crate) async fn check_tags_exist(
    tags: &dyn TagRepository,
    ids: &[i64],
    errors: &mut FormErrors,
) -> Result<(), ServiceError> {
    for id in ids {
        if tags.get_by_id(*id).await?.is_none() {
            errors.add("tags", fields::invalid_choice_message(&id.to_string()));
        }
    }
    Ok(())
}

/// Flag every id in `ids` that names no stored startup
pub(crate) async fn check_startups_exist(
    startups: &dyn StartupRepository,
    field: &str,
    ids: &[i64],
    errors: &mut FormErrors,
) -> Result<(), ServiceError> {
    for id in ids {
        if startups.get_by_id(*id).await?.is_none() {
            errors.add(field, fields::invalid_choice_message(&id.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use anyhow::Context;

    #[tokio::test]
    async fn test_unique_violation_becomes_integrity_violation() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let sqlite_pool = pool.sqlite().unwrap();
        sqlx::query("INSERT INTO tags (name, slug) VALUES ('AI', 'ai')")
            .execute(sqlite_pool)
            .await
            .unwrap();

        let err = sqlx::query("INSERT INTO tags (name, slug) VALUES ('AI', 'ai')")
            .execute(sqlite_pool)
            .await
            .context("Failed to create tag")
            .unwrap_err();

        assert!(matches!(
            ServiceError::from(err),
            ServiceError::IntegrityViolation(_)
        ));
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err = anyhow::anyhow!("disk on fire");
        assert!(matches!(ServiceError::from(err), ServiceError::Internal(_)));
    }
}
