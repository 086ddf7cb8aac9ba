//! Theme engine
//!
//! Template rendering with Tera.
//! - Default templates are compiled into the binary
//! - Files under the override directory replace templates of the same name
//! - Standard variables (`site_name`, `request_path`, `year`) on every page

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ThemeError;

/// Templates shipped with the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct DefaultTemplates;

/// Theme engine for rendering templates
pub struct ThemeEngine {
    /// Tera template engine instance
    tera: Tera,
    /// Directory whose templates override the embedded ones
    override_path: PathBuf,
}

impl ThemeEngine {
    /// Create a theme engine from the embedded templates plus any overrides
    /// found under `override_path`.
    ///
    /// A missing override directory is not an error.
    pub fn new(override_path: &Path) -> Result<Self> {
        let mut engine = Self {
            tera: Tera::default(),
            override_path: override_path.to_path_buf(),
        };
        engine.load_templates()?;
        Ok(engine)
    }

    /// Create a theme engine with the embedded templates only
    pub fn embedded() -> Result<Self> {
        let mut engine = Self {
            tera: Tera::default(),
            override_path: PathBuf::new(),
        };
        engine.load_templates()?;
        Ok(engine)
    }

    fn load_templates(&mut self) -> Result<()> {
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in DefaultTemplates::iter() {
            let file = DefaultTemplates::get(&name)
                .with_context(|| format!("Embedded template vanished: {}", name))?;
            let content = String::from_utf8(file.data.into_owned())
                .map_err(|_| ThemeError::Encoding(name.to_string()))?;
            templates.insert(name.to_string(), content);
        }

        if !self.override_path.as_os_str().is_empty() && self.override_path.is_dir() {
            let mut overrides = Vec::new();
            collect_templates_from_dir(&self.override_path, &self.override_path, &mut overrides)?;
            for (name, content) in overrides {
                tracing::debug!("Template {} overridden from {:?}", name, self.override_path);
                templates.insert(name, content);
            }
        }

        // add_raw_templates resolves inheritance regardless of order.
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())
            .map_err(|e| ThemeError::TemplateError(error_chain("Failed to load templates", &e)))?;

        self.tera = tera;
        Ok(())
    }

    /// Render a template
    ///
    /// # Errors
    /// The Tera error and all of its causes, flattened into one message.
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(error_chain(&format!("Failed to render '{}'", template), &e))
                .into()
        })
    }

    /// Render a template with the standard variables added to `context`
    pub fn render_with_standard_vars(
        &self,
        template: &str,
        context: &TeraContext,
        standard_vars: &StandardTemplateVars,
    ) -> Result<String> {
        let mut full_context = context.clone();
        full_context.insert("site_name", &standard_vars.site_name);
        full_context.insert("request_path", &standard_vars.request_path);
        full_context.insert("year", &standard_vars.year);

        self.render(template, &full_context)
    }

    /// Render a template, falling back to a bare HTML page on failure
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to render template '{}': {}", template, e);
                Self::simple_error_page(template, &e.to_string())
            }
        }
    }

    /// Last-resort page for when no template can be rendered
    fn simple_error_page(template: &str, error: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Template Error</title>
</head>
<body>
    <h1>Template Error</h1>
    <p>Failed to render template: <code>{}</code></p>
    <pre>{}</pre>
</body>
</html>"#,
            tera::escape_html(template),
            tera::escape_html(error)
        )
    }

    /// Names of every loaded template, sorted
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(String::from).collect();
        names.sort();
        names
    }
}

fn error_chain(prefix: &str, err: &tera::Error) -> String {
    let mut message = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Collect `.html` files below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(current_path)
        .with_context(|| format!("Failed to read template directory: {:?}", current_path))?
    {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;
            let template_name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            templates.push((template_name, content));
        }
    }

    Ok(())
}

/// Variables every page receives
#[derive(Debug, Clone, Serialize)]
pub struct StandardTemplateVars {
    /// Site name from configuration
    pub site_name: String,
    /// Path of the current request
    pub request_path: String,
    /// Current year (for the footer)
    pub year: i32,
}

impl StandardTemplateVars {
    pub fn new(site_name: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            request_path: request_path.into(),
            year: chrono::Local::now().year(),
        }
    }
}

#[cfg(test)]
mod tests;
