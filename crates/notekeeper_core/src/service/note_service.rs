//! Note use-case service.
//!
//! # Responsibility
//! - Provide identity-scoped create/get/list/update/delete for notes.
//! - Run the access policy before any repository write.
//! - Fold repository failures into caller-facing outcomes.
//!
//! # Invariants
//! - The acting identity is a parameter of every call.
//! - `notes_for` never returns another user's note.
//! - A non-owner sees `NotFound`, the same as for a slug that does not exist.
//! - Validation failures, duplicate slugs included, come back as
//!   `Invalid` with field-level messages, never as storage errors.

use crate::model::note::{
    normalize_slug, normalize_text, normalize_title, Note, NoteDraft, NoteField, NotePatch,
    NoteValidationError,
};
use crate::model::user::UserId;
use crate::policy::{
    enforce_collection, enforce_note, CollectionAction, Denial, Identity, NoteAction,
};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: NoteField,
    pub message: String,
}

impl From<NoteValidationError> for FieldError {
    fn from(value: NoteValidationError) -> Self {
        Self {
            field: value.field(),
            message: value.to_string(),
        }
    }
}

/// Message shown next to the slug field when it collides with another note.
pub fn duplicate_slug_message(slug: &str) -> String {
    format!("{slug} - this slug already exists, choose a unique value!")
}

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Caller must log in first.
    Unauthenticated,
    /// No such note for this caller (missing or owned by someone else).
    NotFound,
    /// Input rejected; at least one entry.
    Invalid(Vec<FieldError>),
    /// Persistence failure.
    Repo(RepoError),
}

impl NoteServiceError {
    /// Field errors, when this is a validation failure.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::NotFound => write!(f, "note not found"),
            Self::Invalid(errors) => {
                let joined = errors
                    .iter()
                    .map(|err| format!("{}: {}", err.field.as_str(), err.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "invalid note: {joined}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Denial> for NoteServiceError {
    fn from(value: Denial) -> Self {
        match value {
            Denial::Unauthenticated => Self::Unauthenticated,
            Denial::NotFound => Self::NotFound,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NoteValidation(err) => Self::Invalid(vec![err.into()]),
            RepoError::DuplicateSlug(slug) => Self::Invalid(vec![FieldError {
                field: NoteField::Slug,
                message: duplicate_slug_message(&slug),
            }]),
            RepoError::NoteNotFound(_) => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over a repository implementation.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a note owned by `identity`.
    pub fn create_note(
        &self,
        identity: Identity,
        draft: &NoteDraft,
    ) -> Result<Note, NoteServiceError> {
        let author_id = enforce_collection(identity, CollectionAction::Create)?;

        let errors = check_draft(draft);
        if !errors.is_empty() {
            info!(
                "event=note_create module=service status=rejected author_id={author_id} fields={}",
                field_names(&errors)
            );
            return Err(NoteServiceError::Invalid(errors));
        }

        match self.repo.create_note(author_id, draft) {
            Ok(note) => {
                info!(
                    "event=note_create module=service status=ok author_id={author_id} note_id={}",
                    note.id
                );
                Ok(note)
            }
            Err(err) => Err(log_write_failure("note_create", author_id, err)),
        }
    }

    /// The caller's notes in creation order.
    pub fn notes_for(&self, identity: Identity) -> Result<Vec<Note>, NoteServiceError> {
        let owner = enforce_collection(identity, CollectionAction::List)?;
        Ok(self.repo.list_by_owner(owner)?)
    }

    /// Resolves `slug` for `identity` if the policy allows `action`.
    pub fn note_for(
        &self,
        identity: Identity,
        slug: &str,
        action: NoteAction,
    ) -> Result<Note, NoteServiceError> {
        let found = match identity {
            Identity::Anonymous => None,
            Identity::User(_) => self.repo.get_by_slug(slug)?,
        };
        enforce_note(identity, found, action).map_err(|denial| {
            if let Identity::User(user_id) = identity {
                info!(
                    "event=note_access module=service status=denied user_id={user_id} action={}",
                    action.as_str()
                );
            }
            denial.into()
        })
    }

    /// Applies `patch` to the caller's note at `slug`.
    pub fn update_note(
        &self,
        identity: Identity,
        slug: &str,
        patch: &NotePatch,
    ) -> Result<Note, NoteServiceError> {
        let note = self.note_for(identity, slug, NoteAction::Edit)?;
        if patch.is_empty() {
            return Ok(note);
        }

        let errors = check_patch(patch);
        if !errors.is_empty() {
            return Err(NoteServiceError::Invalid(errors));
        }

        match self.repo.update_note(note.author_id, &note, patch) {
            Ok(updated) => {
                info!(
                    "event=note_update module=service status=ok author_id={} note_id={}",
                    note.author_id, note.id
                );
                Ok(updated)
            }
            Err(err) => Err(log_write_failure("note_update", note.author_id, err)),
        }
    }

    /// Deletes the caller's note at `slug` and returns what was removed.
    pub fn delete_note(&self, identity: Identity, slug: &str) -> Result<Note, NoteServiceError> {
        let note = self.note_for(identity, slug, NoteAction::Delete)?;
        self.repo.delete_note(note.author_id, &note)?;
        info!(
            "event=note_delete module=service status=ok author_id={} note_id={}",
            note.author_id, note.id
        );
        Ok(note)
    }
}

fn log_write_failure(event: &'static str, author_id: UserId, err: RepoError) -> NoteServiceError {
    match &err {
        RepoError::DuplicateSlug(_) => info!(
            "event={event} module=service status=rejected author_id={author_id} reason=duplicate_slug"
        ),
        RepoError::NoteValidation(_) | RepoError::NoteNotFound(_) => {}
        other => warn!(
            "event={event} module=service status=error author_id={author_id} error={other}"
        ),
    }
    err.into()
}

fn check_draft(draft: &NoteDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Err(err) = normalize_title(&draft.title) {
        errors.push(err.into());
    }
    if let Err(err) = normalize_text(&draft.text) {
        errors.push(err.into());
    }
    if let Some(Err(err)) = draft.supplied_slug().map(normalize_slug) {
        errors.push(err.into());
    }
    errors
}

fn check_patch(patch: &NotePatch) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if let Some(Err(err)) = patch.title.as_deref().map(normalize_title) {
        errors.push(err.into());
    }
    if let Some(Err(err)) = patch.text.as_deref().map(normalize_text) {
        errors.push(err.into());
    }
    let supplied_slug = patch.slug.as_deref().filter(|slug| !slug.trim().is_empty());
    if let Some(Err(err)) = supplied_slug.map(normalize_slug) {
        errors.push(err.into());
    }
    errors
}

fn field_names(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| err.field.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
