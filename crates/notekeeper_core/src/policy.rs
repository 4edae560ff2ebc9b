//! Ownership-based access control for notes.
//!
//! # Responsibility
//! - Decide whether an identity may act on a note or on the note collection.
//! - Map denials onto the outcome the boundary must show.
//!
//! # Invariants
//! - Only the author may view, edit or delete a note. No override exists.
//! - Anonymous identities are denied everything here.
//! - An authenticated non-owner is told `NotFound`, never "forbidden", so a
//!   note's existence does not leak.

use crate::model::note::Note;
use crate::model::user::UserId;
use std::fmt::{Display, Formatter};

/// Who is acting on a request. Always passed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Anonymous,
    User(UserId),
}

impl Identity {
    pub fn user_id(self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id),
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<Option<UserId>> for Identity {
    fn from(value: Option<UserId>) -> Self {
        value.map_or(Self::Anonymous, Self::User)
    }
}

/// Action on a single existing note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteAction {
    View,
    Edit,
    Delete,
}

impl NoteAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Action on the caller's own note collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionAction {
    Create,
    List,
}

/// How a denied request must be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Send the caller to the login entry point.
    Unauthenticated,
    /// Respond exactly as if the note did not exist.
    NotFound,
}

impl Display for Denial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::NotFound => write!(f, "not found"),
        }
    }
}

/// Whether `identity` may perform `action` on `note`.
///
/// All three actions share the same rule: identity must be the author.
pub fn can_access(identity: Identity, note: &Note, _action: NoteAction) -> bool {
    match identity {
        Identity::Anonymous => false,
        Identity::User(user_id) => user_id == note.author_id,
    }
}

/// Whether `identity` may create notes or list its own notes.
pub fn can_perform(identity: Identity, _action: CollectionAction) -> bool {
    identity.is_authenticated()
}

/// Resolves a note lookup for `identity`.
///
/// `note` is `None` when the slug matched nothing. Anonymous callers get
/// `Unauthenticated` whether or not the note exists.
pub fn enforce_note(
    identity: Identity,
    note: Option<Note>,
    action: NoteAction,
) -> Result<Note, Denial> {
    if !identity.is_authenticated() {
        return Err(Denial::Unauthenticated);
    }
    match note {
        Some(note) if can_access(identity, &note, action) => Ok(note),
        _ => Err(Denial::NotFound),
    }
}

/// Resolves a collection-level action, yielding the acting user id.
pub fn enforce_collection(identity: Identity, action: CollectionAction) -> Result<UserId, Denial> {
    match identity.user_id() {
        Some(user_id) if can_perform(identity, action) => Ok(user_id),
        _ => Err(Denial::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        can_access, can_perform, enforce_collection, enforce_note, CollectionAction, Denial,
        Identity, NoteAction,
    };
    use crate::model::note::Note;

    const ALL_ACTIONS: [NoteAction; 3] = [NoteAction::View, NoteAction::Edit, NoteAction::Delete];

    fn note_by(author_id: i64) -> Note {
        Note {
            id: 7,
            title: "t".to_string(),
            text: "x".to_string(),
            slug: "t".to_string(),
            author_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn only_the_author_can_access_a_note() {
        let note = note_by(1);
        for action in ALL_ACTIONS {
            assert!(can_access(Identity::User(1), &note, action), "{action:?}");
            assert!(!can_access(Identity::User(2), &note, action), "{action:?}");
            assert!(!can_access(Identity::Anonymous, &note, action), "{action:?}");
        }
    }

    #[test]
    fn collection_actions_require_authentication() {
        for action in [CollectionAction::Create, CollectionAction::List] {
            assert!(can_perform(Identity::User(3), action));
            assert!(!can_perform(Identity::Anonymous, action));
        }
        assert_eq!(
            enforce_collection(Identity::User(3), CollectionAction::List),
            Ok(3)
        );
        assert_eq!(
            enforce_collection(Identity::Anonymous, CollectionAction::Create),
            Err(Denial::Unauthenticated)
        );
    }

    #[test]
    fn non_owner_denial_is_indistinguishable_from_missing_note() {
        let foreign = enforce_note(Identity::User(2), Some(note_by(1)), NoteAction::Edit);
        let missing = enforce_note(Identity::User(2), None, NoteAction::Edit);
        assert_eq!(foreign, Err(Denial::NotFound));
        assert_eq!(foreign, missing);
    }

    #[test]
    fn anonymous_is_sent_to_login_even_for_missing_notes() {
        assert_eq!(
            enforce_note(Identity::Anonymous, Some(note_by(1)), NoteAction::View),
            Err(Denial::Unauthenticated)
        );
        assert_eq!(
            enforce_note(Identity::Anonymous, None, NoteAction::Delete),
            Err(Denial::Unauthenticated)
        );
    }

    #[test]
    fn identity_from_optional_user_id() {
        assert_eq!(Identity::from(None), Identity::Anonymous);
        assert_eq!(Identity::from(Some(5)), Identity::User(5));
        assert_eq!(Identity::User(5).user_id(), Some(5));
    }
}
