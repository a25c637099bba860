//! News and comment pages
//!
//! - `GET /` — home feed, public
//! - `GET /news/{id}/` — article detail with comments, public
//! - `POST /news/{id}/` — create a comment, authenticated users only
//! - `GET|POST /edit_comment/{id}/` — comment author only
//! - `GET|POST|DELETE /delete_comment/{id}/` — comment author only

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;

use crate::services::CommentServiceError;
use crate::web::middleware::{login_redirect, AppState, Identity, PageError};
use crate::web::render::base_context;

/// Form payload for creating or editing a comment
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Redirect target after a successful comment mutation.
fn comments_anchor(news_id: i64) -> String {
    format!("/news/{news_id}/#comments")
}

/// A path id that is not a number names nothing.
fn parse_id(raw: &str) -> Result<i64, PageError> {
    raw.parse().map_err(|_| PageError::NotFound)
}

/// GET / - home page with the latest articles
pub async fn home(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let articles = state.news_service.home_page().await?;

    let mut context = base_context(&identity);
    context.insert("articles", &articles);
    Ok(state.renderer.page("home.html", &context)?.into_response())
}

/// GET /news/{id}/ - article detail with its comments
pub async fn news_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    render_detail(&state, id, &identity, "", None).await
}

/// POST /news/{id}/ - create a comment under an article
pub async fn post_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let Some(user) = identity.user() else {
        return Ok(login_redirect(&format!("/news/{id}/")).into_response());
    };

    match state.comment_service.create(id, user.id, &form.text).await {
        Ok(_) => Ok(Redirect::to(&comments_anchor(id)).into_response()),
        Err(CommentServiceError::Validation(message)) => {
            render_detail(&state, id, &identity, &form.text, Some(&message)).await
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /edit_comment/{id}/ - edit form, comment author only
pub async fn edit_comment_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let user = identity.authorized()?;
    let comment = state.comment_service.get_owned(id, user.id).await?;
    render_comment_form(&state, &identity, comment.id, &comment.text, None)
}

/// POST /edit_comment/{id}/ - apply an edit, comment author only
pub async fn edit_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let user = identity.authorized()?;

    match state.comment_service.edit(id, user.id, &form.text).await {
        Ok(comment) => Ok(Redirect::to(&comments_anchor(comment.news_id)).into_response()),
        Err(CommentServiceError::Validation(message)) => {
            render_comment_form(&state, &identity, id, &form.text, Some(&message))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /delete_comment/{id}/ - confirmation page, comment author only
pub async fn delete_comment_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let user = identity.authorized()?;
    let comment = state.comment_service.get_owned(id, user.id).await?;

    let mut context = base_context(&identity);
    context.insert("comment", &comment);
    Ok(state
        .renderer
        .page("comment_delete.html", &context)?
        .into_response())
}

/// POST|DELETE /delete_comment/{id}/ - delete, comment author only
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let id = parse_id(&id)?;
    let user = identity.authorized()?;
    let news_id = state.comment_service.delete(id, user.id).await?;
    Ok(Redirect::to(&comments_anchor(news_id)).into_response())
}

async fn render_detail(
    state: &AppState,
    id: i64,
    identity: &Identity,
    comment_text: &str,
    comment_error: Option<&str>,
) -> Result<Response, PageError> {
    let article = state
        .news_service
        .get(id)
        .await?
        .ok_or(PageError::NotFound)?;
    let comments = state.comment_service.list_for_news(id).await?;

    let mut context = base_context(identity);
    context.insert("article", &article);
    context.insert("comments", &comments);
    context.insert("comment_text", comment_text);
    context.insert("comment_error", &comment_error);

    Ok(state
        .renderer
        .page("news_detail.html", &context)?
        .into_response())
}

fn render_comment_form(
    state: &AppState,
    identity: &Identity,
    comment_id: i64,
    text: &str,
    error: Option<&str>,
) -> Result<Response, PageError> {
    let mut context = base_context(identity);
    context.insert("comment_id", &comment_id);
    context.insert("comment_text", text);
    context.insert("comment_error", &error);
    Ok(state
        .renderer
        .page("comment_form.html", &context)?
        .into_response())
}
