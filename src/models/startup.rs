//! Startup model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A company tracked by the organizer.
///
/// Tags live in the `startup_tags` relation and are loaded separately;
/// news links reference the startup and are deleted with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Startup {
    pub id: i64,
    pub name: String,
    /// URL-friendly slug, unique across startups
    pub slug: String,
    pub description: String,
    pub founded_date: NaiveDate,
    pub website: String,
}

impl Startup {
    pub const NAME_MAX_LENGTH: usize = 31;
    pub const SLUG_MAX_LENGTH: usize = 31;

    /// Build an unsaved startup from validated input and an assigned slug.
    pub fn new(input: &StartupInput, slug: String) -> Self {
        Self {
            id: 0,
            name: input.name.clone(),
            slug,
            description: input.description.clone(),
            founded_date: input.founded_date,
            website: input.website.clone(),
        }
    }

    pub fn list_url() -> &'static str {
        "/startups"
    }

    pub fn create_url() -> &'static str {
        "/startups/new"
    }

    pub fn absolute_url(&self) -> String {
        format!("/startups/{}", self.slug)
    }

    pub fn update_url(&self) -> String {
        format!("/startups/{}/edit", self.slug)
    }

    pub fn delete_url(&self) -> String {
        format!("/startups/{}/delete", self.slug)
    }

    /// Where the "add a news link" form for this startup lives
    pub fn newslink_create_url(&self) -> String {
        format!("/startups/{}/newslinks/new", self.slug)
    }
}

impl fmt::Display for Startup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validated fields for creating or updating a startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupInput {
    pub name: String,
    pub description: String,
    pub founded_date: NaiveDate,
    pub website: String,
    /// Tags to relate; replaces the current set on update
    pub tag_ids: Vec<i64>,
}
