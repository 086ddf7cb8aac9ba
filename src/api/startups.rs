//! Startup pages
//!
//! - GET /startups - Startup list
//! - GET|POST /startups/new - Create a startup
//! - GET /startups/{slug} - Startup with tags, news links and posts
//! - GET|POST /startups/{slug}/edit - Update a startup
//! - GET|POST /startups/{slug}/delete - Delete a startup and its news links

use axum::{
    extract::{Path, State},
    http::Uri,
    response::Response,
    routing::get,
    Form, Router,
};
use tera::Context as TeraContext;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{to_views, NewsLinkView, PostView, StartupView, TagView};
use crate::api::views::{self, EntityTemplates, FormView, Submission};
use crate::forms::{FormData, FormErrors, StartupForm};
use crate::models::Startup;

const TEMPLATES: EntityTemplates = EntityTemplates {
    list: "startup/list.html",
    detail: "startup/detail.html",
    form: "startup/form.html",
    confirm_delete: "startup/confirm_delete.html",
};

/// Build the startups router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/startups", get(list_startups))
        .route("/startups/new", get(new_startup).post(create_startup))
        .route("/startups/{slug}", get(startup_detail))
        .route("/startups/{slug}/edit", get(edit_startup).post(update_startup))
        .route(
            "/startups/{slug}/delete",
            get(confirm_delete_startup).post(delete_startup),
        )
}

async fn list_startups(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let startups = state.startup_service.list().await?;

    let mut context = TeraContext::new();
    context.insert("startups", &to_views::<_, StartupView>(&startups));
    context.insert("create_url", Startup::create_url());
    views::render(&state, &uri, TEMPLATES.list, &context)
}

async fn startup_detail(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let detail = state.startup_service.detail(&slug).await?;

    let mut context = TeraContext::new();
    context.insert("startup", &StartupView::from(&detail.startup));
    context.insert("tags", &to_views::<_, TagView>(&detail.tags));
    context.insert("newslinks", &to_views::<_, NewsLinkView>(&detail.newslinks));
    context.insert("posts", &to_views::<_, PostView>(&detail.posts));
    views::render(&state, &uri, TEMPLATES.detail, &context)
}

async fn render_form(
    state: &AppState,
    uri: &Uri,
    startup: Option<&Startup>,
    data: &FormData,
    errors: &FormErrors,
) -> Result<Response, ApiError> {
    let all_tags = state.tag_service.list().await?;

    let mut context = FormView::context(data, errors);
    context.insert("all_tags", &to_views::<_, TagView>(&all_tags));
    match startup {
        Some(startup) => {
            context.insert("startup", &StartupView::from(startup));
            context.insert("cancel_url", &startup.absolute_url());
        }
        None => context.insert("cancel_url", Startup::list_url()),
    }
    views::render(state, uri, TEMPLATES.form, &context)
}

async fn new_startup(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    render_form(&state, &uri, None, &FormData::default(), &FormErrors::new()).await
}

async fn create_startup(
    State(state): State<AppState>,
    uri: Uri,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let data = FormData::from(pairs);
    let result = match StartupForm::clean(&data) {
        Ok(input) => state.startup_service.create(input).await,
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(startup) => Ok(views::redirect(&startup.absolute_url())),
        Submission::Invalid(errors) => render_form(&state, &uri, None, &data, &errors).await,
    }
}

async fn edit_startup(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let startup = state.startup_service.get(&slug).await?;
    let tags = state.startup_service.tags_of(&startup).await?;
    let data = StartupForm::initial(&startup, &tags);
    render_form(&state, &uri, Some(&startup), &data, &FormErrors::new()).await
}

async fn update_startup(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let startup = state.startup_service.get(&slug).await?;
    let data = FormData::from(pairs);
    let result = match StartupForm::clean(&data) {
        Ok(input) => state.startup_service.update(&slug, input).await,
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(startup) => Ok(views::redirect(&startup.absolute_url())),
        Submission::Invalid(errors) => {
            render_form(&state, &uri, Some(&startup), &data, &errors).await
        }
    }
}

async fn confirm_delete_startup(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let startup = state.startup_service.get(&slug).await?;

    let mut context = TeraContext::new();
    context.insert("startup", &StartupView::from(&startup));
    views::render(&state, &uri, TEMPLATES.confirm_delete, &context)
}

async fn delete_startup(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    state.startup_service.delete(&slug).await?;
    Ok(views::redirect(Startup::list_url()))
}
