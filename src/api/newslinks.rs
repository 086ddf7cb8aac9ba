//! News link pages
//!
//! News links live under their startup:
//! - GET|POST /startups/{slug}/newslinks/new - Add a link to the startup
//! - GET /startups/{slug}/newslinks/{newslink_slug} - Redirect to the startup
//! - GET|POST /startups/{slug}/newslinks/{newslink_slug}/edit - Update a link
//! - GET|POST /startups/{slug}/newslinks/{newslink_slug}/delete - Delete a link

use axum::{
    extract::{Path, State},
    http::Uri,
    response::Response,
    routing::get,
    Form, Router,
};
use tera::Context as TeraContext;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{to_views, NewsLinkView, StartupView};
use crate::api::views::{self, FormView, Submission};
use crate::forms::{FormData, FormErrors, NewsLinkForm};
use crate::models::{NewsLink, Startup};

/// News links have no list or detail page; they are listed on the startup's.
const FORM_TEMPLATE: &str = "newslink/form.html";
const CONFIRM_DELETE_TEMPLATE: &str = "newslink/confirm_delete.html";

/// Build the news links router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/startups/{slug}/newslinks/new",
            get(new_newslink).post(create_newslink),
        )
        .route(
            "/startups/{slug}/newslinks/{newslink_slug}",
            get(newslink_detail),
        )
        .route(
            "/startups/{slug}/newslinks/{newslink_slug}/edit",
            get(edit_newslink).post(update_newslink),
        )
        .route(
            "/startups/{slug}/newslinks/{newslink_slug}/delete",
            get(confirm_delete_newslink).post(delete_newslink),
        )
}

/// `startup` is the startup named in the route.
async fn render_form(
    state: &AppState,
    uri: &Uri,
    startup: &Startup,
    newslink: Option<&NewsLink>,
    data: &FormData,
    errors: &FormErrors,
) -> Result<Response, ApiError> {
    let all_startups = state.startup_service.list().await?;

    let mut context = FormView::context(data, errors);
    context.insert("all_startups", &to_views::<_, StartupView>(&all_startups));
    context.insert("startup", &StartupView::from(startup));
    if let Some(newslink) = newslink {
        context.insert("newslink", &NewsLinkView::from(newslink));
    }
    views::render(state, uri, FORM_TEMPLATE, &context)
}

async fn new_newslink(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let startup = state.newslink_service.startup(&slug).await?;
    let data = NewsLinkForm::initial_for_startup(&startup);
    render_form(&state, &uri, &startup, None, &data, &FormErrors::new()).await
}

async fn create_newslink(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let startup = state.newslink_service.startup(&slug).await?;
    let data = FormData::from(pairs);
    let result = match NewsLinkForm::clean(&data, startup.id) {
        Ok(input) => state.newslink_service.create(input).await,
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(newslink) => Ok(views::redirect(&newslink.absolute_url())),
        Submission::Invalid(errors) => {
            render_form(&state, &uri, &startup, None, &data, &errors).await
        }
    }
}

async fn newslink_detail(
    State(state): State<AppState>,
    Path((slug, newslink_slug)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let newslink = state.newslink_service.get(&slug, &newslink_slug).await?;
    Ok(views::redirect(&newslink.absolute_url()))
}

async fn edit_newslink(
    State(state): State<AppState>,
    uri: Uri,
    Path((slug, newslink_slug)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let startup = state.newslink_service.startup(&slug).await?;
    let newslink = state.newslink_service.get(&slug, &newslink_slug).await?;
    let data = NewsLinkForm::initial(&newslink);
    render_form(
        &state,
        &uri,
        &startup,
        Some(&newslink),
        &data,
        &FormErrors::new(),
    )
    .await
}

async fn update_newslink(
    State(state): State<AppState>,
    uri: Uri,
    Path((slug, newslink_slug)): Path<(String, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let startup = state.newslink_service.startup(&slug).await?;
    let newslink = state.newslink_service.get(&slug, &newslink_slug).await?;
    let data = FormData::from(pairs);
    let result = match NewsLinkForm::clean(&data, startup.id) {
        Ok(input) => {
            state
                .newslink_service
                .update(&slug, &newslink_slug, input)
                .await
        }
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(updated) => Ok(views::redirect(&updated.absolute_url())),
        Submission::Invalid(errors) => {
            render_form(&state, &uri, &startup, Some(&newslink), &data, &errors).await
        }
    }
}

async fn confirm_delete_newslink(
    State(state): State<AppState>,
    uri: Uri,
    Path((slug, newslink_slug)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let newslink = state.newslink_service.get(&slug, &newslink_slug).await?;

    let mut context = TeraContext::new();
    context.insert("newslink", &NewsLinkView::from(&newslink));
    views::render(&state, &uri, CONFIRM_DELETE_TEMPLATE, &context)
}

async fn delete_newslink(
    State(state): State<AppState>,
    Path((slug, newslink_slug)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let removed = state.newslink_service.delete(&slug, &newslink_slug).await?;
    Ok(views::redirect(&removed.absolute_url()))
}
