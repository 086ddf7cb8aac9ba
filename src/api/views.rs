//! Shared pieces of the HTML handlers
//!
//! Every entity module follows the same list / detail / form /
//! confirm-delete shape; the helpers here render those pages and decide
//! what a form submission turns into.

use axum::{
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tera::Context as TeraContext;

use crate::api::middleware::{ApiError, AppState};
use crate::forms::{FormData, FormErrors};
use crate::services::newslink::NON_FIELD_ERRORS;
use crate::services::ServiceError;
use crate::theme::StandardTemplateVars;

/// Template names for one entity type
#[derive(Debug, Clone, Copy)]
pub struct EntityTemplates {
    pub list: &'static str,
    pub detail: &'static str,
    pub form: &'static str,
    pub confirm_delete: &'static str,
}

/// Render `template` with the standard page variables
pub fn render(
    state: &AppState,
    uri: &Uri,
    template: &str,
    context: &TeraContext,
) -> Result<Response, ApiError> {
    let vars = StandardTemplateVars::new(state.site_name.as_ref(), uri.path());
    let html = state
        .theme_engine
        .render_with_standard_vars(template, context, &vars)
        .map_err(|e| {
            tracing::error!("{:#}", e);
            ApiError::internal_error(e.to_string())
        })?;
    Ok(Html(html).into_response())
}

/// 303 See Other, so the browser follows up with a GET
pub fn redirect(url: &str) -> Response {
    Redirect::to(url).into_response()
}

/// Outcome of a create or update submission
pub enum Submission<T> {
    Saved(T),
    Invalid(FormErrors),
}

/// Split validation failures (re-render the form) from real errors
pub fn submission<T>(result: Result<T, ServiceError>) -> Result<Submission<T>, ApiError> {
    match result {
        Ok(saved) => Ok(Submission::Saved(saved)),
        Err(ServiceError::Validation(errors)) => Ok(Submission::Invalid(errors)),
        Err(e) => Err(e.into()),
    }
}

/// The `form` object every form template reads
#[derive(Debug, Serialize)]
pub struct FormView {
    /// Last submitted (or initial) value per field
    pub values: BTreeMap<String, String>,
    pub errors: FormErrors,
    pub non_field_errors: Vec<String>,
    /// Selected tag ids
    pub tags: Vec<i64>,
    /// Selected startup ids
    pub startups: Vec<i64>,
    /// Selected single startup, if any
    pub startup: Option<i64>,
}

impl FormView {
    pub fn new(data: &FormData, errors: &FormErrors) -> Self {
        Self {
            values: data.values(),
            errors: errors.clone(),
            non_field_errors: errors
                .get(NON_FIELD_ERRORS)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            tags: data.ids("tags"),
            startups: data.ids("startups"),
            startup: data.get("startup").and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Context with `form` set, ready for entity-specific additions
    pub fn context(data: &FormData, errors: &FormErrors) -> TeraContext {
        let mut context = TeraContext::new();
        context.insert("form", &Self::new(data, errors));
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_view_collects_selections_and_errors() {
        let data = FormData::new(vec![
            ("name".to_string(), "Acme".to_string()),
            ("tags".to_string(), "1".to_string()),
            ("tags".to_string(), "4".to_string()),
            ("startup".to_string(), " 7 ".to_string()),
        ]);
        let mut errors = FormErrors::new();
        errors.add(NON_FIELD_ERRORS, "Clash.");
        errors.add("name", "Bad.");

        let view = FormView::new(&data, &errors);

        assert_eq!(view.values.get("name").map(String::as_str), Some("Acme"));
        assert_eq!(view.tags, vec![1, 4]);
        assert!(view.startups.is_empty());
        assert_eq!(view.startup, Some(7));
        assert_eq!(view.non_field_errors, vec!["Clash."]);
        assert_eq!(view.errors.get("name"), Some(&["Bad.".to_string()][..]));
    }

    #[test]
    fn test_submission_splits_validation_errors() {
        let mut errors = FormErrors::new();
        errors.add("name", "Bad.");

        assert!(matches!(
            submission::<()>(Err(ServiceError::Validation(errors))),
            Ok(Submission::Invalid(_))
        ));
        assert!(matches!(submission(Ok(1)), Ok(Submission::Saved(1))));

        let err = submission::<()>(Err(ServiceError::NotFound("tag 'x'".to_string())))
            .err()
            .unwrap();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_redirect_is_see_other() {
        let response = redirect("/tags/ai");

        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/tags/ai");
    }
}
