//! Field cleaners
//!
//! Each cleaner turns the raw submitted value into a typed value or a
//! user-facing error message.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_URL: &str = "Enter a valid URL.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Accepted date input formats, tried in order.
///
/// `%Y` takes any number of digits, so the two-digit year has to go first.
pub const DATE_INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:http|ftp)s?://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+(?:[a-z]{2,63}\.?|[a-z0-9-]{2,}\.?)|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/?|[/?]\S+)$",
    )
    .expect("URL pattern is valid")
});

pub fn max_length_message(max: usize, actual: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        max, actual
    )
}

pub fn invalid_choice_message(value: &str) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        value
    )
}

/// Required single-line text, surrounding whitespace stripped.
pub fn char_field(value: Option<&str>, max_length: usize) -> Result<String, String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(REQUIRED.to_string());
    }
    let length = value.chars().count();
    if length > max_length {
        return Err(max_length_message(max_length, length));
    }
    Ok(value.to_string())
}

/// Required long text without a length limit.
pub fn text_field(value: Option<&str>) -> Result<String, String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(REQUIRED.to_string());
    }
    Ok(value.to_string())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Required date in one of [`DATE_INPUT_FORMATS`].
pub fn date_field(value: Option<&str>) -> Result<NaiveDate, String> {
    optional_date_field(value)?.ok_or_else(|| REQUIRED.to_string())
}

/// Date that may be left blank.
pub fn optional_date_field(value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Ok(None);
    }
    parse_date(value)
        .map(Some)
        .ok_or_else(|| INVALID_DATE.to_string())
}

/// Required http(s)/ftp(s) URL.
pub fn url_field(value: Option<&str>, max_length: usize) -> Result<String, String> {
    let value = char_field(value, max_length)?;
    if !URL_REGEX.is_match(&value) {
        return Err(INVALID_URL.to_string());
    }
    Ok(value)
}

/// Required reference to a single row by id.
pub fn choice_field(value: Option<&str>) -> Result<i64, String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(REQUIRED.to_string());
    }
    value.parse().map_err(|_| INVALID_CHOICE.to_string())
}

/// Optional references to many rows by id; duplicates collapse.
pub fn multiple_choice_field(values: &[&str]) -> Result<Vec<i64>, String> {
    let mut ids = Vec::new();
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        let id: i64 = value
            .parse()
            .map_err(|_| invalid_choice_message(value))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
