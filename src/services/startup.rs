//! Startup service
//!
//! Startups own their news links: deleting a startup deletes them too.

use crate::db::repositories::{
    NewsLinkRepository, PostRepository, StartupRepository, TagRepository,
};
use crate::forms::FormErrors;
use crate::models::{NewsLink, Post, Startup, StartupInput, Tag};
use crate::services::slug::assign_unique_slug;
use crate::services::{check_tags_exist, ServiceError};
use std::sync::Arc;

/// A startup with its tags, news links and the posts mentioning it
#[derive(Debug, Clone)]
pub struct StartupDetail {
    pub startup: Startup,
    pub tags: Vec<Tag>,
    pub newslinks: Vec<NewsLink>,
    pub posts: Vec<Post>,
}

/// Startup service
pub struct StartupService {
    startups: Arc<dyn StartupRepository>,
    tags: Arc<dyn TagRepository>,
    newslinks: Arc<dyn NewsLinkRepository>,
    posts: Arc<dyn PostRepository>,
}

impl StartupService {
    pub fn new(
        startups: Arc<dyn StartupRepository>,
        tags: Arc<dyn TagRepository>,
        newslinks: Arc<dyn NewsLinkRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            startups,
            tags,
            newslinks,
            posts,
        }
    }

    /// All startups ordered by name
    pub async fn list(&self) -> Result<Vec<Startup>, ServiceError> {
        Ok(self.startups.list().await?)
    }

    /// Most recently founded startup, if any
    pub async fn latest(&self) -> Result<Option<Startup>, ServiceError> {
        Ok(self.startups.latest().await?)
    }

    pub async fn get(&self, slug: &str) -> Result<Startup, ServiceError> {
        self.startups
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("startup '{}'", slug)))
    }

    /// Tags currently attached to a startup
    pub async fn tags_of(&self, startup: &Startup) -> Result<Vec<Tag>, ServiceError> {
        Ok(self.tags.list_by_startup(startup.id).await?)
    }

    pub async fn detail(&self, slug: &str) -> Result<StartupDetail, ServiceError> {
        let startup = self.get(slug).await?;
        let tags = self.tags.list_by_startup(startup.id).await?;
        let newslinks = self.newslinks.list_by_startup(startup.id).await?;
        let posts = self.posts.list_by_startup(startup.id).await?;
        Ok(StartupDetail {
            startup,
            tags,
            newslinks,
            posts,
        })
    }

    /// Create a startup with a slug derived from its name.
    ///
    /// # Errors
    /// - `Validation` if a selected tag does not exist
    pub async fn create(&self, input: StartupInput) -> Result<Startup, ServiceError> {
        self.validate(&input).await?;

        let startups = &self.startups;
        let slug = assign_unique_slug(
            &input.name,
            Startup::SLUG_MAX_LENGTH,
            "startup",
            |candidate| async move { startups.exists_by_slug(&candidate).await },
        )
        .await?;

        let startup = self
            .startups
            .create(&Startup::new(&input, slug), &input.tag_ids)
            .await?;
        tracing::info!("Created startup {} ({})", startup.slug, startup.id);
        Ok(startup)
    }

    /// Update a startup in place; the slug is kept and tags are replaced.
    pub async fn update(&self, slug: &str, input: StartupInput) -> Result<Startup, ServiceError> {
        let current = self.get(slug).await?;
        self.validate(&input).await?;

        let changed = Startup {
            id: current.id,
            ..Startup::new(&input, current.slug)
        };
        let startup = self.startups.update(&changed, &input.tag_ids).await?;
        tracing::info!("Updated startup {}", startup.slug);
        Ok(startup)
    }

    /// Delete a startup together with its news links.
    pub async fn delete(&self, slug: &str) -> Result<(), ServiceError> {
        let startup = self.get(slug).await?;
        self.startups.delete(startup.id).await?;
        tracing::info!("Deleted startup {} and its news links", startup.slug);
        Ok(())
    }

    async fn validate(&self, input: &StartupInput) -> Result<(), ServiceError> {
        let mut errors = FormErrors::new();
        check_tags_exist(self.tags.as_ref(), &input.tag_ids, &mut errors).await?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }
}
