//! Template view types
//!
//! Flattened, serializable views of the models with their URLs and display
//! strings precomputed, so templates never build paths themselves.

use serde::Serialize;

use crate::models::{NewsLink, Post, Startup, Tag};

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Serialize)]
pub struct TagView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: String,
    pub update_url: String,
    pub delete_url: String,
}

impl From<&Tag> for TagView {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
            slug: tag.slug.clone(),
            url: tag.absolute_url(),
            update_url: tag.update_url(),
            delete_url: tag.delete_url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartupView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub founded_date: String,
    pub website: String,
    pub url: String,
    pub update_url: String,
    pub delete_url: String,
    pub newslink_create_url: String,
}

impl From<&Startup> for StartupView {
    fn from(startup: &Startup) -> Self {
        Self {
            id: startup.id,
            name: startup.name.clone(),
            slug: startup.slug.clone(),
            description: startup.description.clone(),
            founded_date: format_date(startup.founded_date),
            website: startup.website.clone(),
            url: startup.absolute_url(),
            update_url: startup.update_url(),
            delete_url: startup.delete_url(),
            newslink_create_url: startup.newslink_create_url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewsLinkView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub pub_date: String,
    pub link: String,
    pub display: String,
    /// The parent startup's page
    pub url: String,
    pub update_url: String,
    pub delete_url: String,
}

impl From<&NewsLink> for NewsLinkView {
    fn from(link: &NewsLink) -> Self {
        Self {
            id: link.id,
            title: link.title.clone(),
            slug: link.slug.clone(),
            pub_date: format_date(link.pub_date),
            link: link.link.clone(),
            display: link.to_string(),
            url: link.absolute_url(),
            update_url: link.update_url(),
            delete_url: link.delete_url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub text: String,
    pub short_text: String,
    pub pub_date: String,
    pub display: String,
    pub url: String,
    pub update_url: String,
    pub delete_url: String,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            text: post.text.clone(),
            short_text: post.short_text(),
            pub_date: format_date(post.pub_date),
            display: post.to_string(),
            url: post.absolute_url(),
            update_url: post.update_url(),
            delete_url: post.delete_url(),
        }
    }
}

/// Convert a slice of models into views
pub fn to_views<'a, M: 'a, V: From<&'a M>>(items: &'a [M]) -> Vec<V> {
    items.iter().map(V::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_post_view_urls_and_display() {
        let post = Post {
            id: 3,
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            text: "Short.".to_string(),
            pub_date: NaiveDate::from_ymd_opt(2021, 3, 7).unwrap(),
        };

        let view = PostView::from(&post);

        assert_eq!(view.url, "/posts/2021/3/hello");
        assert_eq!(view.update_url, "/posts/2021/3/hello/edit");
        assert_eq!(view.pub_date, "2021-03-07");
        assert_eq!(view.display, "Hello on 2021-03-07");
        assert_eq!(view.short_text, "Short.");
    }

    #[test]
    fn test_newslink_view_points_at_startup() {
        let link = NewsLink {
            id: 1,
            title: "Launch".to_string(),
            slug: "launch".to_string(),
            pub_date: NaiveDate::from_ymd_opt(2020, 2, 3).unwrap(),
            link: "https://news.example.com".to_string(),
            startup_id: 2,
            startup_slug: "acme".to_string(),
            startup_name: "Acme".to_string(),
        };

        let view = NewsLinkView::from(&link);

        assert_eq!(view.url, "/startups/acme");
        assert_eq!(view.delete_url, "/startups/acme/newslinks/launch/delete");
        assert_eq!(view.display, "Acme: Launch");
    }

    #[test]
    fn test_views_converts_every_item() {
        let tags = vec![
            Tag::new("AI".to_string(), "ai".to_string()),
            Tag::new("Web".to_string(), "web".to_string()),
        ];

        let views: Vec<TagView> = to_views(&tags);

        assert_eq!(views.len(), 2);
        assert_eq!(views[1].url, "/tags/web");
    }
}
