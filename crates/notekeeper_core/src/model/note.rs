//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its write-side inputs.
//! - Own field-level validation shared by repository and web forms.
//!
//! # Invariants
//! - `title` is 1..=100 chars after trimming; `text` is never blank.
//! - A stored `slug` always passes [`crate::slug::validate_slug`].
//! - `author_id` is set once at creation and never rewritten.

use crate::model::user::UserId;
use crate::slug::{validate_slug, SlugError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned note id. Ordering follows creation order.
pub type NoteId = i64;

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub text: String,
    pub slug: String,
    /// Owner; the only identity allowed to view, edit or delete this note.
    pub author_id: UserId,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Input for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub text: String,
    /// `None` or blank means "derive from title".
    pub slug: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            slug: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Trimmed, explicitly supplied slug, if any.
    pub fn supplied_slug(&self) -> Option<&str> {
        supplied(self.slug.as_deref())
    }
}

/// Partial update for an existing note. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub text: Option<String>,
    /// `Some("")` re-derives the slug from the resulting title.
    pub slug: Option<String>,
}

impl NotePatch {
    /// Full replacement, as submitted by the edit form.
    pub fn replace_all(
        title: impl Into<String>,
        text: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            text: Some(text.into()),
            slug: Some(slug.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.slug.is_none()
    }
}

/// Form field a validation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteField {
    Title,
    Text,
    Slug,
}

impl NoteField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Text => "text",
            Self::Slug => "slug",
        }
    }
}

/// Field-level note validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    TitleTooLong { max: usize, actual: usize },
    EmptyText,
    InvalidSlug(SlugError),
}

impl NoteValidationError {
    pub fn field(&self) -> NoteField {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => NoteField::Title,
            Self::EmptyText => NoteField::Text,
            Self::InvalidSlug(_) => NoteField::Slug,
        }
    }
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "title must be at most {max} characters (got {actual})")
            }
            Self::EmptyText => write!(f, "text is required"),
            Self::InvalidSlug(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteValidationError {}

impl From<SlugError> for NoteValidationError {
    fn from(value: SlugError) -> Self {
        Self::InvalidSlug(value)
    }
}

/// Trims and checks a title.
pub fn normalize_title(title: &str) -> Result<String, NoteValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    let actual = trimmed.chars().count();
    if actual > TITLE_MAX_CHARS {
        return Err(NoteValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Trims and checks a note body.
pub fn normalize_text(text: &str) -> Result<String, NoteValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Trims and checks a caller-supplied slug.
pub fn normalize_slug(slug: &str) -> Result<String, NoteValidationError> {
    let trimmed = slug.trim();
    validate_slug(trimmed)?;
    Ok(trimmed.to_string())
}

fn supplied(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
