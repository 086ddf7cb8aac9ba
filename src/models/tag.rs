//! Tag model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A label shared by startups and blog posts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-friendly slug, unique across tags
    pub slug: String,
}

impl Tag {
    pub const NAME_MAX_LENGTH: usize = 31;
    pub const SLUG_MAX_LENGTH: usize = 31;

    /// Create a new Tag.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(name: String, slug: String) -> Self {
        Self { id: 0, name, slug }
    }

    pub fn list_url() -> &'static str {
        "/tags"
    }

    pub fn create_url() -> &'static str {
        "/tags/new"
    }

    pub fn absolute_url(&self) -> String {
        format!("/tags/{}", self.slug)
    }

    pub fn update_url(&self) -> String {
        format!("/tags/{}/edit", self.slug)
    }

    pub fn delete_url(&self) -> String {
        format!("/tags/{}/delete", self.slug)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validated fields for creating or updating a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInput {
    pub name: String,
}
