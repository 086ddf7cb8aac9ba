//! Tag pages
//!
//! - GET /tags - Tag list
//! - GET|POST /tags/new - Create a tag
//! - GET /tags/{slug} - Tag with its startups and posts
//! - GET|POST /tags/{slug}/edit - Rename a tag
//! - GET|POST /tags/{slug}/delete - Delete a tag

use axum::{
    extract::{Path, State},
    http::Uri,
    response::Response,
    routing::get,
    Form, Router,
};
use tera::Context as TeraContext;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{to_views, PostView, StartupView, TagView};
use crate::api::views::{self, EntityTemplates, FormView, Submission};
use crate::forms::{FormData, FormErrors, TagForm};
use crate::models::Tag;

const TEMPLATES: EntityTemplates = EntityTemplates {
    list: "tag/list.html",
    detail: "tag/detail.html",
    form: "tag/form.html",
    confirm_delete: "tag/confirm_delete.html",
};

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/new", get(new_tag).post(create_tag))
        .route("/tags/{slug}", get(tag_detail))
        .route("/tags/{slug}/edit", get(edit_tag).post(update_tag))
        .route("/tags/{slug}/delete", get(confirm_delete_tag).post(delete_tag))
}

async fn list_tags(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let tags = state.tag_service.list().await?;

    let mut context = TeraContext::new();
    context.insert("tags", &to_views::<_, TagView>(&tags));
    context.insert("create_url", Tag::create_url());
    views::render(&state, &uri, TEMPLATES.list, &context)
}

async fn tag_detail(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let detail = state.tag_service.detail(&slug).await?;

    let mut context = TeraContext::new();
    context.insert("tag", &TagView::from(&detail.tag));
    context.insert("startups", &to_views::<_, StartupView>(&detail.startups));
    context.insert("posts", &to_views::<_, PostView>(&detail.posts));
    views::render(&state, &uri, TEMPLATES.detail, &context)
}

fn render_form(
    state: &AppState,
    uri: &Uri,
    tag: Option<&Tag>,
    data: &FormData,
    errors: &FormErrors,
) -> Result<Response, ApiError> {
    let mut context = FormView::context(data, errors);
    match tag {
        Some(tag) => {
            context.insert("tag", &TagView::from(tag));
            context.insert("cancel_url", &tag.absolute_url());
        }
        None => context.insert("cancel_url", Tag::list_url()),
    }
    views::render(state, uri, TEMPLATES.form, &context)
}

async fn new_tag(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    render_form(&state, &uri, None, &FormData::default(), &FormErrors::new())
}

async fn create_tag(
    State(state): State<AppState>,
    uri: Uri,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let data = FormData::from(pairs);
    let result = match TagForm::clean(&data) {
        Ok(input) => state.tag_service.create(input).await,
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(tag) => Ok(views::redirect(&tag.absolute_url())),
        Submission::Invalid(errors) => render_form(&state, &uri, None, &data, &errors),
    }
}

async fn edit_tag(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let tag = state.tag_service.get(&slug).await?;
    render_form(&state, &uri, Some(&tag), &TagForm::initial(&tag), &FormErrors::new())
}

async fn update_tag(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let tag = state.tag_service.get(&slug).await?;
    let data = FormData::from(pairs);
    let result = match TagForm::clean(&data) {
        Ok(input) => state.tag_service.update(&slug, input).await,
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(tag) => Ok(views::redirect(&tag.absolute_url())),
        Submission::Invalid(errors) => render_form(&state, &uri, Some(&tag), &data, &errors),
    }
}

async fn confirm_delete_tag(
    State(state): State<AppState>,
    uri: Uri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let tag = state.tag_service.get(&slug).await?;

    let mut context = TeraContext::new();
    context.insert("tag", &TagView::from(&tag));
    views::render(&state, &uri, TEMPLATES.confirm_delete, &context)
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    state.tag_service.delete(&slug).await?;
    Ok(views::redirect(Tag::list_url()))
}
