//! Core domain logic for Notekeeper.
//! This crate is the single source of truth for note ownership and slug
//! invariants; the web crate only translates its outcomes to HTTP.

pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;
pub mod slug;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteDraft, NoteField, NoteId, NotePatch, NoteValidationError};
pub use model::user::{User, UserId, UserValidationError};
pub use policy::{can_access, can_perform, CollectionAction, Denial, Identity, NoteAction};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{FieldError, NoteService, NoteServiceError};
pub use slug::{derive_slug, slugify};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
