//! News link service
//!
//! News links are addressed through their parent startup; slugs only have
//! to be unique within one startup.

use crate::db::repositories::{NewsLinkRepository, StartupRepository};
use crate::forms::{fields, FormErrors};
use crate::models::{NewsLink, NewsLinkInput, Startup};
use crate::services::slug::assign_unique_slug;
use crate::services::ServiceError;
use std::sync::Arc;

/// Form-wide error key
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const SLUG_TAKEN_IN_STARTUP: &str = "News link with this Slug and Startup already exists.";

/// News link service
pub struct NewsLinkService {
    newslinks: Arc<dyn NewsLinkRepository>,
    startups: Arc<dyn StartupRepository>,
}

impl NewsLinkService {
    pub fn new(newslinks: Arc<dyn NewsLinkRepository>, startups: Arc<dyn StartupRepository>) -> Self {
        Self {
            newslinks,
            startups,
        }
    }

    /// Resolve the parent startup named in a news link route
    pub async fn startup(&self, startup_slug: &str) -> Result<Startup, ServiceError> {
        self.startups
            .get_by_slug(startup_slug)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("startup '{}'", startup_slug)))
    }

    /// Get a news link by its slug under a startup
    ///
    /// # Errors
    /// - `NotFound` if either the startup or the link under it is missing
    pub async fn get(&self, startup_slug: &str, slug: &str) -> Result<NewsLink, ServiceError> {
        let startup = self.startup(startup_slug).await?;
        self.newslinks
            .get_by_slug(startup.id, slug)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("news link '{}' of '{}'", slug, startup_slug))
            })
    }

    /// Most recently published link across all startups
    pub async fn latest(&self) -> Result<Option<NewsLink>, ServiceError> {
        Ok(self.newslinks.latest().await?)
    }

    /// Create a news link under `input.startup_id`.
    ///
    /// The slug is derived from the title and made unique among that
    /// startup's links.
    pub async fn create(&self, input: NewsLinkInput) -> Result<NewsLink, ServiceError> {
        self.validate_startup(input.startup_id).await?;

        let newslinks = &self.newslinks;
        let startup_id = input.startup_id;
        let slug = assign_unique_slug(
            &input.title,
            NewsLink::SLUG_MAX_LENGTH,
            "newslink",
            |candidate| async move { newslinks.exists_by_slug(startup_id, &candidate).await },
        )
        .await?;

        let link = self
            .newslinks
            .create(&NewsLink {
                id: 0,
                title: input.title,
                slug,
                pub_date: input.pub_date,
                link: input.link,
                startup_id,
                startup_slug: String::new(),
                startup_name: String::new(),
            })
            .await?;
        tracing::info!(
            "Created news link {} for startup {}",
            link.slug,
            link.startup_slug
        );
        Ok(link)
    }

    /// Update a news link in place, possibly moving it to another startup.
    ///
    /// # Errors
    /// - `Validation` if the target startup is unknown or already has a link
    ///   with this slug
    pub async fn update(
        &self,
        startup_slug: &str,
        slug: &str,
        input: NewsLinkInput,
    ) -> Result<NewsLink, ServiceError> {
        let current = self.get(startup_slug, slug).await?;
        self.validate_startup(input.startup_id).await?;

        if input.startup_id != current.startup_id
            && self
                .newslinks
                .exists_by_slug(input.startup_id, &current.slug)
                .await?
        {
            let mut errors = FormErrors::new();
            errors.add(NON_FIELD_ERRORS, SLUG_TAKEN_IN_STARTUP);
            return Err(ServiceError::Validation(errors));
        }

        let link = self
            .newslinks
            .update(&NewsLink {
                title: input.title,
                pub_date: input.pub_date,
                link: input.link,
                startup_id: input.startup_id,
                ..current
            })
            .await?;
        tracing::info!("Updated news link {}", link.slug);
        Ok(link)
    }

    /// Delete a news link, returning what was removed.
    pub async fn delete(&self, startup_slug: &str, slug: &str) -> Result<NewsLink, ServiceError> {
        let link = self.get(startup_slug, slug).await?;
        self.newslinks.delete(link.id).await?;
        tracing::info!(
            "Deleted news link {} of startup {}",
            link.slug,
            link.startup_slug
        );
        Ok(link)
    }

    async fn validate_startup(&self, startup_id: i64) -> Result<(), ServiceError> {
        if self.startups.get_by_id(startup_id).await?.is_none() {
            let mut errors = FormErrors::new();
            errors.add("startup", fields::INVALID_CHOICE);
            return Err(ServiceError::Validation(errors));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxNewsLinkRepository, SqlxStartupRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::StartupInput;
    use chrono::NaiveDate;

    async fn setup_service() -> (Arc<dyn StartupRepository>, NewsLinkService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let startups = SqlxStartupRepository::boxed(pool.clone());
        let service = NewsLinkService::new(SqlxNewsLinkRepository::boxed(pool), startups.clone());
        (startups, service)
    }

    async fn create_startup(repo: &Arc<dyn StartupRepository>, slug: &str) -> Startup {
        let input = StartupInput {
            name: slug.to_string(),
            description: "desc".to_string(),
            founded_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            website: "https://example.com".to_string(),
            tag_ids: vec![],
        };
        repo.create(&Startup::new(&input, slug.to_string()), &[])
            .await
            .unwrap()
    }

    fn input(title: &str, startup_id: i64) -> NewsLinkInput {
        NewsLinkInput {
            title: title.to_string(),
            pub_date: NaiveDate::from_ymd_opt(2020, 2, 3).unwrap(),
            link: "https://news.example.com/story".to_string(),
            startup_id,
        }
    }

    #[tokio::test]
    async fn test_slug_unique_per_startup() {
        let (startups, service) = setup_service().await;
        let acme = create_startup(&startups, "acme").await;
        let globex = create_startup(&startups, "globex").await;

        let first = service.create(input("Big News", acme.id)).await.unwrap();
        let second = service.create(input("Big News", acme.id)).await.unwrap();
        let elsewhere = service.create(input("Big News", globex.id)).await.unwrap();

        assert_eq!(first.slug, "big-news");
        assert_eq!(second.slug, "big-news-2");
        assert_eq!(elsewhere.slug, "big-news");
    }

    #[tokio::test]
    async fn test_latest_across_startups() {
        let (startups, service) = setup_service().await;
        let acme = create_startup(&startups, "acme").await;
        let globex = create_startup(&startups, "globex").await;
        service.create(input("Older", acme.id)).await.unwrap();
        let mut newer = input("Newer", globex.id);
        newer.pub_date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        service.create(newer).await.unwrap();

        let latest = service.latest().await.unwrap().unwrap();

        assert_eq!(latest.title, "Newer");
        assert_eq!(latest.startup_slug, "globex");
    }

    #[tokio::test]
    async fn test_get_requires_matching_startup() {
        let (startups, service) = setup_service().await;
        let acme = create_startup(&startups, "acme").await;
        create_startup(&startups, "globex").await;
        service.create(input("Launch", acme.id)).await.unwrap();

        assert!(service.get("acme", "launch").await.is_ok());
        assert!(matches!(
            service.get("globex", "launch").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.get("missing", "launch").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_with_unknown_startup_is_validation_error() {
        let (_startups, service) = setup_service().await;

        let result = service.create(input("Launch", 99)).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_moves_between_startups() {
        let (startups, service) = setup_service().await;
        let acme = create_startup(&startups, "acme").await;
        let globex = create_startup(&startups, "globex").await;
        service.create(input("Launch", acme.id)).await.unwrap();

        let moved = service
            .update("acme", "launch", input("Relaunch", globex.id))
            .await
            .unwrap();

        assert_eq!(moved.slug, "launch");
        assert_eq!(moved.title, "Relaunch");
        assert_eq!(moved.startup_slug, "globex");
        assert!(service.get("globex", "launch").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_rejects_slug_clash_in_target_startup() {
        let (startups, service) = setup_service().await;
        let acme = create_startup(&startups, "acme").await;
        let globex = create_startup(&startups, "globex").await;
        service.create(input("Launch", acme.id)).await.unwrap();
        service.create(input("Launch", globex.id)).await.unwrap();

        let result = service
            .update("acme", "launch", input("Launch", globex.id))
            .await;

        match result {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors.get(NON_FIELD_ERRORS).unwrap()[0], SLUG_TAKEN_IN_STARTUP);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_returns_removed_link() {
        let (startups, service) = setup_service().await;
        let acme = create_startup(&startups, "acme").await;
        service.create(input("Launch", acme.id)).await.unwrap();

        let removed = service.delete("acme", "launch").await.unwrap();

        assert_eq!(removed.absolute_url(), "/startups/acme");
        assert!(matches!(
            service.get("acme", "launch").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
