//! Form decoding and validation
//!
//! Handlers receive `application/x-www-form-urlencoded` bodies as a list of
//! key/value pairs (many-to-many fields repeat their key). A form's `clean`
//! turns that list into the typed input a service accepts, or into
//! per-field error messages for re-rendering.

pub mod fields;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{
    NewsLink, NewsLinkInput, Post, PostInput, Startup, StartupInput, Tag, TagInput,
    URL_MAX_LENGTH,
};

/// Submitted (or initial) form values in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Last value submitted for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted for `key`
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Ids under a repeated key, skipping anything unparseable
    pub fn ids(&self, key: &str) -> Vec<i64> {
        self.get_all(key)
            .into_iter()
            .filter_map(|v| v.trim().parse().ok())
            .collect()
    }

    /// Single-valued view of the data for refilling inputs
    pub fn values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        for (key, value) in &self.pairs {
            values.insert(key.clone(), value.clone());
        }
        values
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.push((key.to_string(), value.into()));
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

/// Field name → error messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record a cleaner's error under `field`, passing the value through
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct TagForm;

impl TagForm {
    pub fn clean(data: &FormData) -> Result<TagInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = errors.check(
            "name",
            fields::char_field(data.get("name"), Tag::NAME_MAX_LENGTH),
        );

        match name {
            Some(name) if errors.is_empty() => Ok(TagInput { name }),
            _ => Err(errors),
        }
    }

    pub fn initial(tag: &Tag) -> FormData {
        let mut data = FormData::default();
        data.push("name", tag.name.as_str());
        data
    }
}

pub struct StartupForm;

impl StartupForm {
    pub fn clean(data: &FormData) -> Result<StartupInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = errors.check(
            "name",
            fields::char_field(data.get("name"), Startup::NAME_MAX_LENGTH),
        );
        let description = errors.check("description", fields::text_field(data.get("description")));
        let founded_date = errors.check("founded_date", fields::date_field(data.get("founded_date")));
        let website = errors.check(
            "website",
            fields::url_field(data.get("website"), URL_MAX_LENGTH),
        );
        let tag_ids = errors.check("tags", fields::multiple_choice_field(&data.get_all("tags")));

        match (name, description, founded_date, website, tag_ids) {
            (Some(name), Some(description), Some(founded_date), Some(website), Some(tag_ids))
                if errors.is_empty() =>
            {
                Ok(StartupInput {
                    name,
                    description,
                    founded_date,
                    website,
                    tag_ids,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn initial(startup: &Startup, tags: &[Tag]) -> FormData {
        let mut data = FormData::default();
        data.push("name", startup.name.as_str());
        data.push("description", startup.description.as_str());
        data.push("founded_date", format_date(startup.founded_date));
        data.push("website", startup.website.as_str());
        for tag in tags {
            data.push("tags", tag.id.to_string());
        }
        data
    }
}

pub struct NewsLinkForm;

impl NewsLinkForm {
    /// `default_startup_id` fills in a missing or blank `startup` field.
    pub fn clean(data: &FormData, default_startup_id: i64) -> Result<NewsLinkInput, FormErrors> {
        let mut errors = FormErrors::new();
        let title = errors.check(
            "title",
            fields::char_field(data.get("title"), NewsLink::TITLE_MAX_LENGTH),
        );
        let pub_date = errors.check("pub_date", fields::date_field(data.get("pub_date")));
        let link = errors.check("link", fields::url_field(data.get("link"), URL_MAX_LENGTH));
        let startup_id = match data.get("startup").map(str::trim) {
            None | Some("") => Some(default_startup_id),
            value => errors.check("startup", fields::choice_field(value)),
        };

        match (title, pub_date, link, startup_id) {
            (Some(title), Some(pub_date), Some(link), Some(startup_id)) if errors.is_empty() => {
                Ok(NewsLinkInput {
                    title,
                    pub_date,
                    link,
                    startup_id,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn initial(link: &NewsLink) -> FormData {
        let mut data = FormData::default();
        data.push("title", link.title.as_str());
        data.push("pub_date", format_date(link.pub_date));
        data.push("link", link.link.as_str());
        data.push("startup", link.startup_id.to_string());
        data
    }

    /// Empty form with the parent startup pre-selected
    pub fn initial_for_startup(startup: &Startup) -> FormData {
        let mut data = FormData::default();
        data.push("startup", startup.id.to_string());
        data
    }
}

pub struct PostForm;

impl PostForm {
    pub fn clean(data: &FormData) -> Result<PostInput, FormErrors> {
        let mut errors = FormErrors::new();
        let title = errors.check(
            "title",
            fields::char_field(data.get("title"), Post::TITLE_MAX_LENGTH),
        );
        let text = errors.check("text", fields::text_field(data.get("text")));
        let pub_date = errors.check("pub_date", fields::optional_date_field(data.get("pub_date")));
        let tag_ids = errors.check("tags", fields::multiple_choice_field(&data.get_all("tags")));
        let startup_ids = errors.check(
            "startups",
            fields::multiple_choice_field(&data.get_all("startups")),
        );

        match (title, text, pub_date, tag_ids, startup_ids) {
            (Some(title), Some(text), Some(pub_date), Some(tag_ids), Some(startup_ids))
                if errors.is_empty() =>
            {
                Ok(PostInput {
                    title,
                    text,
                    pub_date,
                    tag_ids,
                    startup_ids,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn initial(post: &Post, tags: &[Tag], startups: &[Startup]) -> FormData {
        let mut data = FormData::default();
        data.push("title", post.title.as_str());
        data.push("text", post.text.as_str());
        data.push("pub_date", format_date(post.pub_date));
        for tag in tags {
            data.push("tags", tag.id.to_string());
        }
        for startup in startups {
            data.push("startups", startup.id.to_string());
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_form_data_access() {
        let data = form(&[("tags", "1"), ("name", "a"), ("tags", "x"), ("tags", "3")]);

        assert_eq!(data.get("name"), Some("a"));
        assert_eq!(data.get("missing"), None);
        assert_eq!(data.get_all("tags"), vec!["1", "x", "3"]);
        assert_eq!(data.ids("tags"), vec![1, 3]);
        assert_eq!(data.values().get("name").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_tag_form_valid() {
        let input = TagForm::clean(&form(&[("name", " Fintech ")])).unwrap();
        assert_eq!(input.name, "Fintech");
    }

    #[test]
    fn test_tag_form_errors() {
        let errors = TagForm::clean(&form(&[])).unwrap_err();
        assert_eq!(errors.get("name"), Some(&[fields::REQUIRED.to_string()][..]));

        let errors = TagForm::clean(&form(&[("name", &"x".repeat(32))])).unwrap_err();
        assert_eq!(
            errors.get("name").unwrap()[0],
            "Ensure this value has at most 31 characters (it has 32)."
        );
    }

    #[test]
    fn test_startup_form_valid() {
        let input = StartupForm::clean(&form(&[
            ("name", "Acme"),
            ("description", "Rockets."),
            ("founded_date", "03/09/2014"),
            ("website", "https://acme.example.com"),
            ("tags", "2"),
            ("tags", "5"),
        ]))
        .unwrap();

        assert_eq!(input.name, "Acme");
        assert_eq!(input.founded_date, NaiveDate::from_ymd_opt(2014, 3, 9).unwrap());
        assert_eq!(input.tag_ids, vec![2, 5]);
    }

    #[test]
    fn test_startup_form_collects_every_error() {
        let errors = StartupForm::clean(&form(&[
            ("name", ""),
            ("founded_date", "yesterday"),
            ("website", "acme"),
            ("tags", "two"),
        ]))
        .unwrap_err();

        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["description", "founded_date", "name", "tags", "website"]
        );
        assert_eq!(errors.get("website").unwrap()[0], fields::INVALID_URL);
        assert_eq!(errors.get("founded_date").unwrap()[0], fields::INVALID_DATE);
    }

    #[test]
    fn test_startup_initial_roundtrips_through_clean() {
        let startup = Startup {
            id: 1,
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            description: "Rockets.".to_string(),
            founded_date: NaiveDate::from_ymd_opt(2014, 3, 9).unwrap(),
            website: "https://acme.example.com".to_string(),
        };
        let tags = vec![Tag {
            id: 4,
            name: "AI".to_string(),
            slug: "ai".to_string(),
        }];

        let input = StartupForm::clean(&StartupForm::initial(&startup, &tags)).unwrap();

        assert_eq!(input.founded_date, startup.founded_date);
        assert_eq!(input.tag_ids, vec![4]);
    }

    #[test]
    fn test_newslink_form_defaults_startup() {
        let data = form(&[
            ("title", "Launch"),
            ("pub_date", "2020-01-02"),
            ("link", "https://news.example.com/launch"),
        ]);
        assert_eq!(NewsLinkForm::clean(&data, 9).unwrap().startup_id, 9);

        let data = form(&[
            ("title", "Launch"),
            ("pub_date", "2020-01-02"),
            ("link", "https://news.example.com/launch"),
            ("startup", "3"),
        ]);
        assert_eq!(NewsLinkForm::clean(&data, 9).unwrap().startup_id, 3);
    }

    #[test]
    fn test_newslink_form_invalid_startup() {
        let data = form(&[
            ("title", "Launch"),
            ("pub_date", "2020-01-02"),
            ("link", "https://news.example.com/launch"),
            ("startup", "acme"),
        ]);
        let errors = NewsLinkForm::clean(&data, 9).unwrap_err();
        assert_eq!(errors.get("startup").unwrap()[0], fields::INVALID_CHOICE);
    }

    #[test]
    fn test_post_form_optional_date() {
        let input = PostForm::clean(&form(&[("title", "Hello"), ("text", "World")])).unwrap();
        assert_eq!(input.pub_date, None);
        assert!(input.tag_ids.is_empty());
        assert!(input.startup_ids.is_empty());

        let input = PostForm::clean(&form(&[
            ("title", "Hello"),
            ("text", "World"),
            ("pub_date", "2021-03-07"),
            ("startups", "1"),
        ]))
        .unwrap();
        assert_eq!(input.pub_date, NaiveDate::from_ymd_opt(2021, 3, 7));
        assert_eq!(input.startup_ids, vec![1]);
    }

    #[test]
    fn test_form_errors_display() {
        let mut errors = FormErrors::new();
        errors.add("name", "Bad.");
        errors.add("name", "Worse.");
        errors.add("link", "Nope.");
        assert_eq!(errors.to_string(), "link: Nope.; name: Bad. Worse.");
    }
}
