//! Post service
//!
//! Posts are addressed by publication year, month and slug. A post created
//! without a publication date is dated today.

use crate::db::repositories::{PostRepository, StartupRepository, TagRepository};
use crate::forms::FormErrors;
use crate::models::{Post, PostInput, Startup, Tag};
use crate::services::slug::assign_unique_slug;
use crate::services::{check_startups_exist, check_tags_exist, ServiceError};
use chrono::{Datelike, Local, NaiveDate};
use std::sync::Arc;

/// A post with the tags and startups it references
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub tags: Vec<Tag>,
    pub startups: Vec<Startup>,
}

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    tags: Arc<dyn TagRepository>,
    startups: Arc<dyn StartupRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        tags: Arc<dyn TagRepository>,
        startups: Arc<dyn StartupRepository>,
    ) -> Self {
        Self {
            posts,
            tags,
            startups,
        }
    }

    /// All posts, newest first, then by title
    pub async fn list(&self) -> Result<Vec<Post>, ServiceError> {
        Ok(self.posts.list().await?)
    }

    pub async fn latest(&self) -> Result<Option<Post>, ServiceError> {
        Ok(self.posts.latest().await?)
    }

    /// Get a post by slug, checking it was published in `year`/`month`
    ///
    /// # Errors
    /// - `NotFound` if the slug is unknown or the date does not match
    pub async fn get(&self, year: i32, month: u32, slug: &str) -> Result<Post, ServiceError> {
        self.posts
            .get_by_slug(slug)
            .await?
            .filter(|post| post.pub_date.year() == year && post.pub_date.month() == month)
            .ok_or_else(|| ServiceError::NotFound(format!("post '{}/{}/{}'", year, month, slug)))
    }

    pub async fn detail(&self, year: i32, month: u32, slug: &str) -> Result<PostDetail, ServiceError> {
        let post = self.get(year, month, slug).await?;
        let (tags, startups) = self.relations(&post).await?;
        Ok(PostDetail {
            post,
            tags,
            startups,
        })
    }

    /// Tags and startups currently attached to a post
    pub async fn relations(&self, post: &Post) -> Result<(Vec<Tag>, Vec<Startup>), ServiceError> {
        let tags = self.tags.list_by_post(post.id).await?;
        let startups = self.startups.list_by_post(post.id).await?;
        Ok((tags, startups))
    }

    /// Create a post with a slug derived from its title.
    pub async fn create(&self, input: PostInput) -> Result<Post, ServiceError> {
        self.validate(&input).await?;

        let posts = &self.posts;
        let slug = assign_unique_slug(
            &input.title,
            Post::SLUG_MAX_LENGTH,
            "post",
            |candidate| async move { posts.exists_by_slug(&candidate).await },
        )
        .await?;

        let post = Post {
            id: 0,
            title: input.title,
            slug,
            text: input.text,
            pub_date: input.pub_date.unwrap_or_else(today),
        };
        let post = self
            .posts
            .create(&post, &input.tag_ids, &input.startup_ids)
            .await?;
        tracing::info!("Created post {}", post.absolute_url());
        Ok(post)
    }

    /// Update a post in place. A blank date keeps the current one.
    pub async fn update(
        &self,
        year: i32,
        month: u32,
        slug: &str,
        input: PostInput,
    ) -> Result<Post, ServiceError> {
        let current = self.get(year, month, slug).await?;
        self.validate(&input).await?;

        let changed = Post {
            title: input.title,
            text: input.text,
            pub_date: input.pub_date.unwrap_or(current.pub_date),
            ..current
        };
        let post = self
            .posts
            .update(&changed, &input.tag_ids, &input.startup_ids)
            .await?;
        tracing::info!("Updated post {}", post.absolute_url());
        Ok(post)
    }

    pub async fn delete(&self, year: i32, month: u32, slug: &str) -> Result<(), ServiceError> {
        let post = self.get(year, month, slug).await?;
        self.posts.delete(post.id).await?;
        tracing::info!("Deleted post {}", post.absolute_url());
        Ok(())
    }

    async fn validate(&self, input: &PostInput) -> Result<(), ServiceError> {
        let mut errors = FormErrors::new();
        check_tags_exist(self.tags.as_ref(), &input.tag_ids, &mut errors).await?;
        check_startups_exist(
            self.startups.as_ref(),
            "startups",
            &input.startup_ids,
            &mut errors,
        )
        .await?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
