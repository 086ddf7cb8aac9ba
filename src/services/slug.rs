//! Slug assignment
//!
//! Slugs are derived once, at creation, from a human-readable field:
//! transliterated to ASCII, lowercased, non-alphanumeric runs collapsed to a
//! single hyphen, and cut to the column width. Collisions are resolved by
//! appending `-2`, `-3`, ... while still fitting the width.

use anyhow::Result;
use std::future::Future;

/// Path segments the routers use for fixed pages (`/tags/new`, ...).
/// A slug equal to one of these would shadow the entity's detail page.
pub const RESERVED_SLUGS: &[&str] = &["new"];

fn is_reserved(candidate: &str) -> bool {
    RESERVED_SLUGS.contains(&candidate)
}

/// Normalize `source` into a slug of at most `max_length` characters.
///
/// Falls back to `fallback` when nothing URL-safe is left.
pub fn slugify(source: &str, max_length: usize, fallback: &str) -> String {
    let slug = truncate(&slug::slugify(source), max_length);
    if slug.is_empty() {
        truncate(fallback, max_length)
    } else {
        slug
    }
}

/// `base` with `-{n}` appended, shortening `base` so the result fits.
pub fn with_suffix(base: &str, n: u32, max_length: usize) -> String {
    let suffix = format!("-{}", n);
    let base = truncate(base, max_length.saturating_sub(suffix.len()));
    format!("{}{}", base, suffix)
}

fn truncate(slug: &str, max_length: usize) -> String {
    let cut: String = slug.chars().take(max_length).collect();
    cut.trim_matches('-').to_string()
}

/// Derive a slug from `source` that `is_taken` reports as free.
///
/// `is_taken` is asked about each candidate in turn: the plain slug first,
/// then the suffixed variants. Reserved slugs count as taken.
pub async fn assign_unique_slug<F, Fut>(
    source: &str,
    max_length: usize,
    fallback: &str,
    mut is_taken: F,
) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let base = slugify(source, max_length, fallback);
    if !is_reserved(&base) && !is_taken(base.clone()).await? {
        return Ok(base);
    }

    let mut n = 2;
    loop {
        let candidate = with_suffix(&base, n, max_length);
        if !is_reserved(&candidate) && !is_taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World", 31, "tag"), "hello-world");
        assert_eq!(slugify("  Rust & Go!  ", 31, "tag"), "rust-go");
        assert_eq!(slugify("Café Society", 31, "tag"), "cafe-society");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify("!!!", 31, "tag"), "tag");
        assert_eq!(slugify("", 63, "newslink"), "newslink");
    }

    #[test]
    fn test_slugify_truncates_without_trailing_hyphen() {
        // "aaaa-bbbb" cut at 5 would end in a hyphen.
        assert_eq!(slugify("aaaa bbbb", 5, "tag"), "aaaa");
        assert_eq!(slugify(&"x".repeat(40), 31, "tag").len(), 31);
    }

    #[test]
    fn test_with_suffix_fits_max_length() {
        assert_eq!(with_suffix("ai", 2, 31), "ai-2");

        let base = "a".repeat(31);
        let suffixed = with_suffix(&base, 12, 31);
        assert_eq!(suffixed.len(), 31);
        assert!(suffixed.ends_with("-12"));
    }

    #[tokio::test]
    async fn test_assign_unique_slug_resolves_collisions() {
        let taken: HashSet<String> = ["ai", "ai-2"].iter().map(|s| s.to_string()).collect();

        let slug = assign_unique_slug("AI", 31, "tag", |candidate| {
            let taken = taken.contains(&candidate);
            async move { Ok::<_, anyhow::Error>(taken) }
        })
        .await
        .unwrap();

        assert_eq!(slug, "ai-3");
    }

    #[tokio::test]
    async fn test_assign_unique_slug_free_base() {
        let slug = assign_unique_slug("Fintech", 31, "tag", |_| async {
            Ok::<_, anyhow::Error>(false)
        })
        .await
        .unwrap();
        assert_eq!(slug, "fintech");
    }

    #[tokio::test]
    async fn test_assign_unique_slug_skips_reserved() {
        let slug = assign_unique_slug("New", 31, "tag", |_| async {
            Ok::<_, anyhow::Error>(false)
        })
        .await
        .unwrap();
        assert_eq!(slug, "new-2");
    }

    #[tokio::test]
    async fn test_assign_unique_slug_propagates_errors() {
        let result = assign_unique_slug("AI", 31, "tag", |_| async {
            Err::<bool, _>(anyhow::anyhow!("db down"))
        })
        .await;
        assert!(result.is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_slugify_is_url_safe(source in "\\PC{0,80}", max_length in 3usize..64) {
            let slug = slugify(&source, max_length, "post");

            prop_assert!(!slug.is_empty());
            prop_assert!(slug.len() <= max_length);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
        }

        #[test]
        fn prop_slugify_is_deterministic(source in "[A-Za-z0-9 ]{0,40}") {
            prop_assert_eq!(slugify(&source, 31, "tag"), slugify(&source, 31, "tag"));
        }

        #[test]
        fn prop_suffixed_slugs_are_distinct_and_fit(base in "[a-z0-9]{1,63}", count in 2u32..15) {
            let mut seen = HashSet::new();
            seen.insert(base.clone());
            for n in 2..=count {
                let candidate = with_suffix(&base, n, 31);
                prop_assert!(candidate.len() <= 31);
                prop_assert!(seen.insert(candidate));
            }
        }
    }
}
