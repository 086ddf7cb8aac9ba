//! Blog post pages
//!
//! - GET /posts - Post list, newest first
//! - GET|POST /posts/new - Write a post
//! - GET /posts/{year}/{month}/{slug} - Post with its tags and startups
//! - GET|POST /posts/{year}/{month}/{slug}/edit - Update a post
//! - GET|POST /posts/{year}/{month}/{slug}/delete - Delete a post

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
use crate::forms::{FormData, FormErrors, PostForm};
use crate::models::Post;

const TEMPLATES: EntityTemplates = EntityTemplates {
    list: "post/list.html",
    detail: "post/detail.html",
    form: "post/form.html",
    confirm_delete: "post/confirm_delete.html",
};

/// Build the posts router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/new", get(new_post).post(create_post))
        .route("/posts/{year}/{month}/{slug}", get(post_detail))
        .route(
            "/posts/{year}/{month}/{slug}/edit",
            get(edit_post).post(update_post),
        )
        .route(
            "/posts/{year}/{month}/{slug}/delete",
            get(confirm_delete_post).post(delete_post),
        )
}

/// Year, month and slug of a post route
///
/// Taken as strings so that a non-numeric year or month is a plain 404.
type ArchivePath = Path<(String, String, String)>;

fn parse_archive(year: &str, month: &str) -> Result<(i32, u32), ApiError> {
    match (year.parse::<i32>(), month.parse::<u32>()) {
        (Ok(year), Ok(month)) => Ok((year, month)),
        _ => Err(ApiError::not_found(format!(
            "No posts are filed under {}/{}.",
            year, month
        ))),
    }
}

async fn list_posts(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let posts = state.post_service.list().await?;

    let mut context = TeraContext::new();
    context.insert("posts", &to_views::<_, PostView>(&posts));
    context.insert("create_url", Post::create_url());
    views::render(&state, &uri, TEMPLATES.list, &context)
}

async fn post_detail(
    State(state): State<AppState>,
    uri: Uri,
    Path((year, month, slug)): ArchivePath,
) -> Result<Response, ApiError> {
    let (year, month) = parse_archive(&year, &month)?;
    let detail = state.post_service.detail(year, month, &slug).await?;

    let mut context = TeraContext::new();
    context.insert("post", &PostView::from(&detail.post));
    context.insert("tags", &to_views::<_, TagView>(&detail.tags));
    context.insert("startups", &to_views::<_, StartupView>(&detail.startups));
    views::render(&state, &uri, TEMPLATES.detail, &context)
}

async fn render_form(
    state: &AppState,
    uri: &Uri,
    post: Option<&Post>,
    data: &FormData,
    errors: &FormErrors,
) -> Result<Response, ApiError> {
    let all_tags = state.tag_service.list().await?;
    let all_startups = state.startup_service.list().await?;

    let mut context = FormView::context(data, errors);
    context.insert("all_tags", &to_views::<_, TagView>(&all_tags));
    context.insert("all_startups", &to_views::<_, StartupView>(&all_startups));
    match post {
        Some(post) => {
            context.insert("post", &PostView::from(post));
            context.insert("cancel_url", &post.absolute_url());
        }
        None => context.insert("cancel_url", Post::list_url()),
    }
    views::render(state, uri, TEMPLATES.form, &context)
}

async fn new_post(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    render_form(&state, &uri, None, &FormData::default(), &FormErrors::new()).await
}

async fn create_post(
    State(state): State<AppState>,
    uri: Uri,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let data = FormData::from(pairs);
    let result = match PostForm::clean(&data) {
        Ok(input) => state.post_service.create(input).await,
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(post) => Ok(views::redirect(&post.absolute_url())),
        Submission::Invalid(errors) => render_form(&state, &uri, None, &data, &errors).await,
    }
}

async fn edit_post(
    State(state): State<AppState>,
    uri: Uri,
    Path((year, month, slug)): ArchivePath,
) -> Result<Response, ApiError> {
    let (year, month) = parse_archive(&year, &month)?;
    let post = state.post_service.get(year, month, &slug).await?;
    let (tags, startups) = state.post_service.relations(&post).await?;
    let data = PostForm::initial(&post, &tags, &startups);
    render_form(&state, &uri, Some(&post), &data, &FormErrors::new()).await
}

async fn update_post(
    State(state): State<AppState>,
    uri: Uri,
    Path((year, month, slug)): ArchivePath,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let (year, month) = parse_archive(&year, &month)?;
    let post = state.post_service.get(year, month, &slug).await?;
    let data = FormData::from(pairs);
    let result = match PostForm::clean(&data) {
        Ok(input) => state.post_service.update(year, month, &slug, input).await,
        Err(errors) => Err(errors.into()),
    };

    match views::submission(result)? {
        Submission::Saved(updated) => Ok(views::redirect(&updated.absolute_url())),
        Submission::Invalid(errors) => {
            render_form(&state, &uri, Some(&post), &data, &errors).await
        }
    }
}

async fn confirm_delete_post(
    State(state): State<AppState>,
    uri: Uri,
    Path((year, month, slug)): ArchivePath,
) -> Result<Response, ApiError> {
    let (year, month) = parse_archive(&year, &month)?;
    let post = state.post_service.get(year, month, &slug).await?;

    let mut context = TeraContext::new();
    context.insert("post", &PostView::from(&post));
    views::render(&state, &uri, TEMPLATES.confirm_delete, &context)
}

async fn delete_post(
    State(state): State<AppState>,
    Path((year, month, slug)): ArchivePath,
) -> Result<Response, ApiError> {
    let (year, month) = parse_archive(&year, &month)?;
    state.post_service.delete(year, month, &slug).await?;
    Ok(views::redirect(Post::list_url()))
}
