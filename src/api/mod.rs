//! API layer - HTTP handlers and routing
//!
//! Server-rendered HTML pages for:
//! - Tags
//! - Startups and their news links
//! - Blog posts
//!
//! Every error response passes through the error-page middleware, which
//! renders the themed 404 / 500 page.

pub mod middleware;
pub mod newslinks;
pub mod posts;
pub mod responses;
pub mod startups;
pub mod tags;
pub mod views;

use axum::{
    http::Uri,
    middleware as axum_middleware,
    response::Redirect,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::models::Post;

pub use middleware::{ApiError, AppState};

/// Build the page routes
pub fn build_page_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .merge(tags::router())
        .merge(startups::router())
        .merge(newslinks::router())
        .merge(posts::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    build_page_router()
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - The blog is the front page
async fn root() -> Redirect {
    Redirect::to(Post::list_url())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No page at {}.", uri.path()))
}
