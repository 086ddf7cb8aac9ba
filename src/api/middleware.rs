//! API middleware
//!
//! Contains:
//! - Shared application state
//! - `ApiError`, the error type every handler returns
//! - The error-page middleware that renders `404.html` / `500.html`

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::db::repositories::{
    SqlxNewsLinkRepository, SqlxPostRepository, SqlxStartupRepository, SqlxTagRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{NewsLinkService, PostService, ServiceError, StartupService, TagService};
use crate::theme::{StandardTemplateVars, ThemeEngine};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub tag_service: Arc<TagService>,
    pub startup_service: Arc<StartupService>,
    pub newslink_service: Arc<NewsLinkService>,
    pub post_service: Arc<PostService>,
    pub theme_engine: Arc<ThemeEngine>,
    pub site_name: Arc<str>,
}

impl AppState {
    /// Wire the services over one database pool
    pub fn new(pool: DynDatabasePool, theme_engine: ThemeEngine, site_name: impl Into<String>) -> Self {
        let tags = SqlxTagRepository::boxed(pool.clone());
        let startups = SqlxStartupRepository::boxed(pool.clone());
        let newslinks = SqlxNewsLinkRepository::boxed(pool.clone());
        let posts = SqlxPostRepository::boxed(pool);

        Self {
            tag_service: Arc::new(TagService::new(
                tags.clone(),
                startups.clone(),
                posts.clone(),
            )),
            startup_service: Arc::new(StartupService::new(
                startups.clone(),
                tags.clone(),
                newslinks.clone(),
                posts.clone(),
            )),
            newslink_service: Arc::new(NewsLinkService::new(newslinks, startups.clone())),
            post_service: Arc::new(PostService::new(posts, tags, startups)),
            theme_engine: Arc::new(theme_engine),
            site_name: Arc::from(site_name.into()),
        }
    }
}

/// Error returned by handlers
///
/// The response carries an [`ErrorPage`] extension; [`render_error_pages`]
/// turns it into a themed HTML page.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => Self::not_found(format!("No such {}.", what)),
            ServiceError::Validation(errors) => Self::bad_request(errors.to_string()),
            ServiceError::IntegrityViolation(message) => {
                tracing::error!("Integrity violation: {}", message);
                Self::internal_error(message)
            }
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                Self::internal_error(e.to_string())
            }
        }
    }
}

/// Marker left on error responses for the error-page middleware
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message.clone()).into_response();
        response.extensions_mut().insert(ErrorPage {
            message: self.message,
        });
        response
    }
}

/// Replace the body of 404 and 5xx error responses with the themed page
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let status = response.status();
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let mut context = TeraContext::new();
    let template = if status == StatusCode::NOT_FOUND {
        context.insert("message", &page.message);
        "404.html"
    } else if status.is_server_error() {
        "500.html"
    } else {
        return response;
    };

    let vars = StandardTemplateVars::new(state.site_name.as_ref(), path);
    let html = match state
        .theme_engine
        .render_with_standard_vars(template, &context, &vars)
    {
        Ok(html) => html,
        Err(e) => {
            tracing::error!("Failed to render error page: {:#}", e);
            state.theme_engine.render_with_fallback(template, &context)
        }
    };

    (status, Html(html)).into_response()
}
