//! Note pages.
//!
//! # Invariants
//! - The caller's identity comes from the session, never from the form.
//! - Validation failures re-render the form with status 200.
//! - Successful writes redirect to `/done/`.

use crate::error::WebError;
use crate::identity::RequestIdentity;
use crate::state::AppState;
use crate::views::{self, NoteFormValues};
use axum::extract::{Path, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use notekeeper_core::policy::enforce_collection;
use notekeeper_core::{
    CollectionAction, FieldError, NoteAction, NoteDraft, NotePatch, NoteServiceError,
};
use serde::Deserialize;

pub const DONE_PATH: &str = "/done/";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoteForm {
    pub title: String,
    pub text: String,
    pub slug: String,
}

impl NoteForm {
    fn values(&self) -> NoteFormValues {
        NoteFormValues {
            title: self.title.clone(),
            text: self.text.clone(),
            slug: self.slug.clone(),
        }
    }
}

fn form_errors(errors: &[FieldError]) -> Vec<(&'static str, String)> {
    errors
        .iter()
        .map(|err| (err.field.as_str(), err.message.clone()))
        .collect()
}

pub async fn home(RequestIdentity(identity): RequestIdentity) -> Response {
    views::home(identity.is_authenticated())
}

pub async fn list(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    uri: Uri,
) -> Result<Response, WebError> {
    let notes = state
        .with_notes(|notes| notes.notes_for(identity))
        .await
        .map_err(|err| WebError::from_service(err, &uri))?;
    Ok(views::note_list(&notes))
}

pub async fn add_form(
    RequestIdentity(identity): RequestIdentity,
    uri: Uri,
) -> Result<Response, WebError> {
    enforce_collection(identity, CollectionAction::Create)
        .map_err(|denial| WebError::from_denial(denial, &uri))?;
    Ok(views::note_form(None, &NoteFormValues::default(), &[]))
}

pub async fn add(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    uri: Uri,
    Form(form): Form<NoteForm>,
) -> Result<Response, WebError> {
    let draft = NoteDraft::new(form.title.clone(), form.text.clone()).with_slug(form.slug.clone());
    match state
        .with_notes(|notes| notes.create_note(identity, &draft))
        .await
    {
        Ok(_) => Ok(Redirect::to(DONE_PATH).into_response()),
        Err(NoteServiceError::Invalid(errors)) => Ok(views::note_form(
            None,
            &form.values(),
            &form_errors(&errors),
        )),
        Err(err) => Err(WebError::from_service(err, &uri)),
    }
}

pub async fn done(
    RequestIdentity(identity): RequestIdentity,
    uri: Uri,
) -> Result<Response, WebError> {
    enforce_collection(identity, CollectionAction::List)
        .map_err(|denial| WebError::from_denial(denial, &uri))?;
    Ok(views::done())
}

pub async fn detail(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(slug): Path<String>,
    uri: Uri,
) -> Result<Response, WebError> {
    let note = state
        .with_notes(|notes| notes.note_for(identity, &slug, NoteAction::View))
        .await
        .map_err(|err| WebError::from_service(err, &uri))?;
    Ok(views::note_detail(&note))
}

pub async fn edit_form(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(slug): Path<String>,
    uri: Uri,
) -> Result<Response, WebError> {
    let note = state
        .with_notes(|notes| notes.note_for(identity, &slug, NoteAction::Edit))
        .await
        .map_err(|err| WebError::from_service(err, &uri))?;
    Ok(views::note_form(
        Some(&note.slug),
        &NoteFormValues::from(&note),
        &[],
    ))
}

pub async fn edit(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(slug): Path<String>,
    uri: Uri,
    Form(form): Form<NoteForm>,
) -> Result<Response, WebError> {
    let patch = NotePatch::replace_all(form.title.clone(), form.text.clone(), form.slug.clone());
    match state
        .with_notes(|notes| notes.update_note(identity, &slug, &patch))
        .await
    {
        Ok(_) => Ok(Redirect::to(DONE_PATH).into_response()),
        Err(NoteServiceError::Invalid(errors)) => Ok(views::note_form(
            Some(&slug),
            &form.values(),
            &form_errors(&errors),
        )),
        Err(err) => Err(WebError::from_service(err, &uri)),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(slug): Path<String>,
    uri: Uri,
) -> Result<Response, WebError> {
    let note = state
        .with_notes(|notes| notes.note_for(identity, &slug, NoteAction::Delete))
        .await
        .map_err(|err| WebError::from_service(err, &uri))?;
    Ok(views::delete_confirm(&note))
}

pub async fn delete(
    State(state): State<AppState>,
    RequestIdentity(identity): RequestIdentity,
    Path(slug): Path<String>,
    uri: Uri,
) -> Result<Redirect, WebError> {
    state
        .with_notes(|notes| notes.delete_note(identity, &slug))
        .await
        .map_err(|err| WebError::from_service(err, &uri))?;
    Ok(Redirect::to(DONE_PATH))
}
