//! Tag service
//!
//! Implements business logic for tag management:
//! - Listing tags and resolving them by slug
//! - Creating tags with a unique, derived slug
//! - Collecting the startups and posts filed under a tag

use crate::db::repositories::{PostRepository, StartupRepository, TagRepository};
use crate::models::{Post, Startup, Tag, TagInput};
use crate::services::slug::assign_unique_slug;
use crate::services::ServiceError;
use std::sync::Arc;

/// A tag together with everything filed under it
#[derive(Debug, Clone)]
pub struct TagDetail {
    pub tag: Tag,
    pub startups: Vec<Startup>,
    pub posts: Vec<Post>,
}

/// Tag service
pub struct TagService {
    tags: Arc<dyn TagRepository>,
    startups: Arc<dyn StartupRepository>,
    posts: Arc<dyn PostRepository>,
}

impl TagService {
    pub fn new(
        tags: Arc<dyn TagRepository>,
        startups: Arc<dyn StartupRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            tags,
            startups,
            posts,
        }
    }

    /// All tags ordered by name
    pub async fn list(&self) -> Result<Vec<Tag>, ServiceError> {
        Ok(self.tags.list().await?)
    }

    /// Get tag by slug
    ///
    /// # Errors
    /// - `NotFound` if no tag has this slug
    pub async fn get(&self, slug: &str) -> Result<Tag, ServiceError> {
        self.tags
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("tag '{}'", slug)))
    }

    /// Tag plus the startups and posts carrying it
    pub async fn detail(&self, slug: &str) -> Result<TagDetail, ServiceError> {
        let tag = self.get(slug).await?;
        let startups = self.startups.list_by_tag(tag.id).await?;
        let posts = self.posts.list_by_tag(tag.id).await?;
        Ok(TagDetail {
            tag,
            startups,
            posts,
        })
    }

    /// Create a tag, deriving its slug from the name.
    ///
    /// A name whose slug is taken gets a numbered slug (`ai`, `ai-2`, ...).
    pub async fn create(&self, input: TagInput) -> Result<Tag, ServiceError> {
        let tags = &self.tags;
        let slug = assign_unique_slug(
            &input.name,
            Tag::SLUG_MAX_LENGTH,
            "tag",
            |candidate| async move { tags.exists_by_slug(&candidate).await },
        )
        .await?;

        let tag = self.tags.create(&Tag::new(input.name, slug)).await?;
        tracing::info!("Created tag {} ({})", tag.slug, tag.id);
        Ok(tag)
    }

    /// Rename a tag; the slug stays as it was.
    pub async fn update(&self, slug: &str, input: TagInput) -> Result<Tag, ServiceError> {
        let mut tag = self.get(slug).await?;
        tag.name = input.name;
        let tag = self.tags.update(&tag).await?;
        tracing::info!("Updated tag {}", tag.slug);
        Ok(tag)
    }

    /// Delete a tag, detaching it from startups and posts.
    pub async fn delete(&self, slug: &str) -> Result<(), ServiceError> {
        let tag = self.get(slug).await?;
        self.tags.delete(tag.id).await?;
        tracing::info!("Deleted tag {}", tag.slug);
        Ok(())
    }
}
