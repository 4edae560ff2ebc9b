//! Shared application state.

use crate::password::Credentials;
use notekeeper_core::{
    NoteService, NoteServiceError, RepoResult, SqliteNoteRepository, SqliteUserRepository,
};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

/// State handed to every handler.
///
/// One SQLite connection serves all requests. Closures passed to
/// [`AppState::with_notes`] and [`AppState::with_users`] run synchronously
/// under the lock, so it is never held across an `.await`.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    credentials: Credentials,
}

impl AppState {
    pub fn new(conn: Connection, credentials: Credentials) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Runs `f` against a note service bound to the shared connection.
    pub async fn with_notes<T>(
        &self,
        f: impl FnOnce(&NoteService<SqliteNoteRepository<'_>>) -> Result<T, NoteServiceError> + Send,
    ) -> Result<T, NoteServiceError> {
        let conn = self.db.lock().await;
        let service = NoteService::new(SqliteNoteRepository::try_new(&conn)?);
        f(&service)
    }

    /// Runs `f` against the user repository on the shared connection.
    pub async fn with_users<T>(
        &self,
        f: impl FnOnce(&SqliteUserRepository<'_>) -> RepoResult<T> + Send,
    ) -> RepoResult<T> {
        let conn = self.db.lock().await;
        let users = SqliteUserRepository::try_new(&conn)?;
        f(&users)
    }
}
