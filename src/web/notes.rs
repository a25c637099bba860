//! Note pages
//!
//! All routes here sit behind `require_login`; anonymous requests never
//! reach these handlers. Detail, edit and delete answer 404 unless the
//! requester owns the note.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};

use crate::models::NoteInput;
use crate::services::NoteServiceError;
use crate::web::middleware::{AppState, Identity, PageError};
use crate::web::render::base_context;

const SUCCESS_URL: &str = "/notes/done/";

/// GET /notes/ - the requester's own notes, nobody else's
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let user = identity.authorized()?;
    let notes = state.note_service.list_for(user.id).await?;

    let mut context = base_context(&identity);
    context.insert("notes", &notes);
    Ok(state
        .renderer
        .page("notes_list.html", &context)?
        .into_response())
}

/// GET /notes/add/ - creation form
pub async fn add_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    render_note_form(&state, &identity, "/notes/add/", &NoteInput::default(), None)
}

/// POST /notes/add/ - create a note
pub async fn add_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Form(input): Form<NoteInput>,
) -> Result<Response, PageError> {
    let user = identity.authorized()?;

    match state.note_service.create(user.id, &input).await {
        Ok(_) => Ok(Redirect::to(SUCCESS_URL).into_response()),
        Err(NoteServiceError::Validation { field, message }) => render_note_form(
            &state,
            &identity,
            "/notes/add/",
            &input,
            Some((field, &message)),
        ),
        Err(err) => Err(err.into()),
    }
}

/// GET /notes/done/ - post-mutation success page
pub async fn done_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let context = base_context(&identity);
    Ok(state.renderer.page("done.html", &context)?.into_response())
}

/// GET /notes/{slug}/ - note detail, owner only
pub async fn note_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let user = identity.authorized()?;
    let note = state.note_service.get_owned(&slug, user.id).await?;

    let mut context = base_context(&identity);
    context.insert("note", &note);
    Ok(state
        .renderer
        .page("note_detail.html", &context)?
        .into_response())
}

/// GET /notes/{slug}/edit/ - edit form, owner only
pub async fn edit_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let user = identity.authorized()?;
    let note = state.note_service.get_owned(&slug, user.id).await?;

    let input = NoteInput {
        title: note.title,
        text: note.text,
        slug: note.slug.clone(),
    };
    render_note_form(
        &state,
        &identity,
        &format!("/notes/{}/edit/", note.slug),
        &input,
        None,
    )
}

/// POST /notes/{slug}/edit/ - apply an edit, owner only
pub async fn edit_note(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(identity): Extension<Identity>,
    Form(input): Form<NoteInput>,
) -> Result<Response, PageError> {
    let user = identity.authorized()?;

    match state.note_service.update(&slug, user.id, &input).await {
        Ok(_) => Ok(Redirect::to(SUCCESS_URL).into_response()),
        Err(NoteServiceError::Validation { field, message }) => render_note_form(
            &state,
            &identity,
            &format!("/notes/{slug}/edit/"),
            &input,
            Some((field, &message)),
        ),
        Err(err) => Err(err.into()),
    }
}

/// GET /notes/{slug}/delete/ - confirmation page, owner only
pub async fn delete_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let user = identity.authorized()?;
    let note = state.note_service.get_owned(&slug, user.id).await?;

    let mut context = base_context(&identity);
    context.insert("note", &note);
    Ok(state
        .renderer
        .page("note_delete.html", &context)?
        .into_response())
}

/// POST /notes/{slug}/delete/ - delete, owner only
pub async fn delete_note(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, PageError> {
    let user = identity.authorized()?;
    state.note_service.delete(&slug, user.id).await?;
    Ok(Redirect::to(SUCCESS_URL).into_response())
}

fn render_note_form(
    state: &AppState,
    identity: &Identity,
    action: &str,
    input: &NoteInput,
    error: Option<(&str, &str)>,
) -> Result<Response, PageError> {
    let mut context = base_context(identity);
    context.insert("action", action);
    context.insert("input", input);
    context.insert("error_field", &error.map(|(field, _)| field));
    context.insert("error_message", &error.map(|(_, message)| message));
    Ok(state
        .renderer
        .page("note_form.html", &context)?
        .into_response())
}
