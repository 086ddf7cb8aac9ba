//! Tests for the theme engine

use super::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

const EXPECTED_TEMPLATES: &[&str] = &[
    "404.html",
    "500.html",
    "base.html",
    "newslink/confirm_delete.html",
    "newslink/form.html",
    "post/confirm_delete.html",
    "post/detail.html",
    "post/form.html",
    "post/list.html",
    "startup/confirm_delete.html",
    "startup/detail.html",
    "startup/form.html",
    "startup/list.html",
    "tag/confirm_delete.html",
    "tag/detail.html",
    "tag/form.html",
    "tag/list.html",
];

fn standard_vars() -> StandardTemplateVars {
    StandardTemplateVars::new("Test Organizer", "/tags")
}

fn empty_form() -> serde_json::Value {
    json!({
        "values": {},
        "errors": {},
        "non_field_errors": [],
        "tags": [],
        "startups": [],
        "startup": null,
    })
}

#[test]
fn test_embedded_templates_are_loaded() {
    let engine = ThemeEngine::embedded().unwrap();

    assert_eq!(engine.template_names(), EXPECTED_TEMPLATES);
}

#[test]
fn test_missing_override_directory_is_fine() {
    let temp_dir = TempDir::new().unwrap();
    let engine = ThemeEngine::new(&temp_dir.path().join("does-not-exist")).unwrap();

    assert_eq!(engine.template_names(), EXPECTED_TEMPLATES);
}

#[test]
fn test_render_tag_list_with_standard_vars() {
    let engine = ThemeEngine::embedded().unwrap();
    let mut context = TeraContext::new();
    context.insert("create_url", "/tags/new");
    context.insert(
        "tags",
        &json!([{ "name": "AI & ML", "url": "/tags/ai-ml" }]),
    );

    let html = engine
        .render_with_standard_vars("tag/list.html", &context, &standard_vars())
        .unwrap();

    assert!(html.contains("<title>Tags - Test Organizer</title>"));
    // Autoescaping also covers `/`.
    assert!(html.contains(r#"<a href="&#x2F;tags&#x2F;ai-ml">AI &amp; ML</a>"#));
}

#[test]
fn test_render_empty_list() {
    let engine = ThemeEngine::embedded().unwrap();
    let mut context = TeraContext::new();
    context.insert("create_url", "/startups/new");
    context.insert("startups", &Vec::<serde_json::Value>::new());

    let html = engine
        .render_with_standard_vars("startup/list.html", &context, &standard_vars())
        .unwrap();

    assert!(html.contains("No startups yet."));
}

#[test]
fn test_render_form_with_errors() {
    let engine = ThemeEngine::embedded().unwrap();
    let mut form = empty_form();
    form["values"] = json!({ "name": "<b>bold</b>" });
    form["errors"] = json!({ "name": ["This field is required."] });
    let mut context = TeraContext::new();
    context.insert("form", &form);
    context.insert("cancel_url", "/tags");

    let html = engine
        .render_with_standard_vars("tag/form.html", &context, &standard_vars())
        .unwrap();

    assert!(html.contains("Create a New Tag"));
    assert!(html.contains("This field is required."));
    assert!(html.contains("&lt;b&gt;bold&lt;&#x2F;b&gt;"));
}

#[test]
fn test_render_selected_options() {
    let engine = ThemeEngine::embedded().unwrap();
    let mut form = empty_form();
    form["tags"] = json!([2]);
    let mut context = TeraContext::new();
    context.insert("form", &form);
    context.insert("cancel_url", "/startups");
    context.insert(
        "all_tags",
        &json!([{ "id": 1, "name": "AI" }, { "id": 2, "name": "Web" }]),
    );

    let html = engine
        .render_with_standard_vars("startup/form.html", &context, &standard_vars())
        .unwrap();

    assert!(html.contains(r#"<option value="1">AI</option>"#));
    assert!(html.contains(r#"<option value="2" selected>Web</option>"#));
}

#[test]
fn test_override_replaces_embedded_template() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("tag")).unwrap();
    fs::write(
        temp_dir.path().join("tag").join("list.html"),
        r#"{% extends "base.html" %}{% block content %}CUSTOM {{ tags | length }}{% endblock content %}"#,
    )
    .unwrap();

    let engine = ThemeEngine::new(temp_dir.path()).unwrap();
    let mut context = TeraContext::new();
    context.insert("tags", &vec!["a", "b"]);

    let html = engine
        .render_with_standard_vars("tag/list.html", &context, &standard_vars())
        .unwrap();

    assert!(html.contains("CUSTOM 2"));
    assert!(html.contains("<nav>"));
}

#[test]
fn test_broken_override_fails_to_load() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("base.html"), "{% block content %}").unwrap();

    let result = ThemeEngine::new(temp_dir.path());

    assert!(result.is_err());
}

#[test]
fn test_render_error_names_template() {
    let engine = ThemeEngine::embedded().unwrap();

    let err = engine
        .render("tag/detail.html", &TeraContext::new())
        .unwrap_err();

    assert!(err.to_string().contains("tag/detail.html"));
}

#[test]
fn test_render_with_fallback_returns_simple_page() {
    let engine = ThemeEngine::embedded().unwrap();

    let html = engine.render_with_fallback("nope.html", &TeraContext::new());

    assert!(html.contains("Template Error"));
    assert!(html.contains("nope.html"));
}

#[test]
fn test_error_pages_render_with_minimal_context() {
    let engine = ThemeEngine::embedded().unwrap();

    for (template, heading) in [("404.html", "Page Not Found"), ("500.html", "Server Error")] {
        let html = engine
            .render_with_standard_vars(template, &TeraContext::new(), &standard_vars())
            .unwrap();
        assert!(html.contains(heading), "{}", template);
        assert!(html.contains("&#x2F;tags"), "{}", template);
    }
}
