//! News link model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An external article about one startup.
///
/// Rows are always read joined with their startup, so the parent's slug and
/// name travel with the link for URLs and display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsLink {
    pub id: i64,
    pub title: String,
    /// URL-friendly slug, unique among the parent startup's links
    pub slug: String,
    pub pub_date: NaiveDate,
    pub link: String,
    pub startup_id: i64,
    pub startup_slug: String,
    pub startup_name: String,
}

impl NewsLink {
    pub const TITLE_MAX_LENGTH: usize = 63;
    pub const SLUG_MAX_LENGTH: usize = 63;

    /// A news link has no page of its own; it lives on its startup's page.
    pub fn absolute_url(&self) -> String {
        format!("/startups/{}", self.startup_slug)
    }

    pub fn update_url(&self) -> String {
        format!(
            "/startups/{}/newslinks/{}/edit",
            self.startup_slug, self.slug
        )
    }

    pub fn delete_url(&self) -> String {
        format!(
            "/startups/{}/newslinks/{}/delete",
            self.startup_slug, self.slug
        )
    }
}

impl fmt::Display for NewsLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.startup_name, self.title)
    }
}

/// Validated fields for creating or updating a news link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsLinkInput {
    pub title: String,
    pub pub_date: NaiveDate,
    pub link: String,
    pub startup_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewsLink {
        NewsLink {
            id: 7,
            title: "Acme raises Series A".to_string(),
            slug: "acme-raises-series-a".to_string(),
            pub_date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
            link: "https://news.example.com/acme".to_string(),
            startup_id: 3,
            startup_slug: "acme".to_string(),
            startup_name: "Acme".to_string(),
        }
    }

    #[test]
    fn test_newslink_absolute_url_is_startup_page() {
        assert_eq!(sample().absolute_url(), "/startups/acme");
    }

    #[test]
    fn test_newslink_urls() {
        let link = sample();
        assert_eq!(
            link.update_url(),
            "/startups/acme/newslinks/acme-raises-series-a/edit"
        );
        assert_eq!(
            link.delete_url(),
            "/startups/acme/newslinks/acme-raises-series-a/delete"
        );
    }

    #[test]
    fn test_newslink_display() {
        assert_eq!(sample().to_string(), "Acme: Acme raises Series A");
    }
}
