//! Blog post model

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of words kept by [`Post::short_text`]
const SHORT_TEXT_WORDS: usize = 20;

/// A blog post, filed under its publication year and month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    /// URL-friendly slug, unique across posts
    pub slug: String,
    pub text: String,
    pub pub_date: NaiveDate,
}

impl Post {
    pub const TITLE_MAX_LENGTH: usize = 63;
    pub const SLUG_MAX_LENGTH: usize = 63;

    pub fn list_url() -> &'static str {
        "/posts"
    }

    pub fn create_url() -> &'static str {
        "/posts/new"
    }

    /// `/posts/{year}/{month}/{slug}`, month without zero padding
    pub fn absolute_url(&self) -> String {
        format!("{}/{}", self.date_prefix(), self.slug)
    }

    pub fn update_url(&self) -> String {
        format!("{}/{}/edit", self.date_prefix(), self.slug)
    }

    pub fn delete_url(&self) -> String {
        format!("{}/{}/delete", self.date_prefix(), self.slug)
    }

    fn date_prefix(&self) -> String {
        format!("/posts/{}/{}", self.pub_date.year(), self.pub_date.month())
    }

    /// Teaser for list pages.
    ///
    /// Text longer than 20 characters is cut to its first 20 words and
    /// suffixed with `" ..."`.
    pub fn short_text(&self) -> String {
        if self.text.chars().count() > SHORT_TEXT_WORDS {
            let words: Vec<&str> = self.text.split_whitespace().take(SHORT_TEXT_WORDS).collect();
            format!("{} ...", words.join(" "))
        } else {
            self.text.clone()
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.title, self.pub_date.format("%Y-%m-%d"))
    }
}

/// Validated fields for creating or updating a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    /// `None` means "today" on create and "keep the current date" on update
    pub pub_date: Option<NaiveDate>,
    pub tag_ids: Vec<i64>,
    pub startup_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_with_text(text: &str) -> Post {
        Post {
            id: 1,
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            text: text.to_string(),
            pub_date: NaiveDate::from_ymd_opt(2021, 3, 7).unwrap(),
        }
    }

    #[test]
    fn test_post_urls_have_unpadded_month() {
        let post = post_with_text("hi");

        assert_eq!(post.absolute_url(), "/posts/2021/3/hello");
        assert_eq!(post.update_url(), "/posts/2021/3/hello/edit");
        assert_eq!(post.delete_url(), "/posts/2021/3/hello/delete");
    }

    #[test]
    fn test_post_display() {
        assert_eq!(post_with_text("hi").to_string(), "Hello on 2021-03-07");
    }

    #[test]
    fn test_short_text_keeps_short_text() {
        let post = post_with_text("Only a few words.");
        assert_eq!(post.short_text(), "Only a few words.");
    }

    #[test]
    fn test_short_text_exactly_twenty_chars_unchanged() {
        let post = post_with_text("abcdefghij klmnopqrs");
        assert_eq!(post.short_text(), "abcdefghij klmnopqrs");
    }

    #[test]
    fn test_short_text_long_text_with_few_words() {
        // Over 20 characters but fewer than 20 words: all words kept.
        let post = post_with_text("Startups   are\nwonderful things indeed");
        assert_eq!(post.short_text(), "Startups are wonderful things indeed ...");
    }

    #[test]
    fn test_short_text_truncates_to_twenty_words() {
        let words: Vec<String> = (1..=30).map(|i| format!("w{}", i)).collect();
        let post = post_with_text(&words.join(" "));

        let expected = format!("{} ...", words[..20].join(" "));
        assert_eq!(post.short_text(), expected);
    }
}
