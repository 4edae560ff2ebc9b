//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes and derive a slug when the caller supplies none.
//! - Translate the `notes.slug` UNIQUE constraint into `DuplicateSlug`.
//!
//! # Invariants
//! - Slug uniqueness is global across authors and is checked by the same
//!   statement that writes the row, so two writers cannot both win.
//! - Writes are scoped by `author_id`; a non-owner write touches no rows.
//! - Owner listings are ordered by `id ASC` (creation order).

use crate::model::note::{
    normalize_slug, normalize_text, normalize_title, Note, NoteDraft, NotePatch,
};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult};
use crate::slug::derive_slug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_COLUMNS: &str = "id, title, text, slug, author_id, created_at, updated_at";

/// Data access contract for notes.
///
/// Every mutating call names the acting owner explicitly; there is no
/// ambient "current user".
pub trait NoteRepository {
    /// Inserts a note owned by `author_id`. Derives the slug from the title
    /// when `draft.slug` is absent or blank.
    fn create_note(&self, author_id: UserId, draft: &NoteDraft) -> RepoResult<Note>;
    /// Looks a note up by slug, regardless of author.
    fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Note>>;
    /// Notes owned by `owner`, oldest first.
    fn list_by_owner(&self, owner: UserId) -> RepoResult<Vec<Note>>;
    /// Applies `patch` to `note` if `owner` authored it.
    fn update_note(&self, owner: UserId, note: &Note, patch: &NotePatch) -> RepoResult<Note>;
    /// Removes `note` if `owner` authored it.
    fn delete_note(&self, owner: UserId, note: &Note) -> RepoResult<()>;
    /// Number of stored notes using `slug` (0 or 1).
    fn count_by_slug(&self, slug: &str) -> RepoResult<u64>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a connection opened via `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, author_id: UserId, draft: &NoteDraft) -> RepoResult<Note> {
        let title = normalize_title(&draft.title)?;
        let text = normalize_text(&draft.text)?;
        let slug = match draft.supplied_slug() {
            Some(slug) => normalize_slug(slug)?,
            None => derive_slug(&title),
        };

        self.conn
            .query_row(
                &format!(
                    "INSERT INTO notes (title, text, slug, author_id)
                     VALUES (?1, ?2, ?3, ?4)
                     RETURNING {NOTE_COLUMNS};"
                ),
                params![title, text, slug, author_id],
                parse_note_row,
            )
            .map_err(|err| map_write_error(err, &slug))
    }

    fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE slug = ?1;"),
                [slug],
                parse_note_row,
            )
            .optional()?;
        Ok(note)
    }

    fn list_by_owner(&self, owner: UserId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM notes
             WHERE author_id = ?1
             ORDER BY id ASC;"
        ))?;
        let rows = stmt.query_map([owner], parse_note_row)?;
        let mut notes = Vec::new();
        for note in rows {
            notes.push(note?);
        }
        Ok(notes)
    }

    fn update_note(&self, owner: UserId, note: &Note, patch: &NotePatch) -> RepoResult<Note> {
        let title = match patch.title.as_deref() {
            Some(title) => normalize_title(title)?,
            None => note.title.clone(),
        };
        let text = match patch.text.as_deref() {
            Some(text) => normalize_text(text)?,
            None => note.text.clone(),
        };
        let slug = match patch.slug.as_deref() {
            Some(slug) if slug.trim().is_empty() => derive_slug(&title),
            Some(slug) => normalize_slug(slug)?,
            None => note.slug.clone(),
        };

        // The row's own slug never trips the constraint, so keeping the
        // current slug is always allowed.
        let updated = self
            .conn
            .query_row(
                &format!(
                    "UPDATE notes
                     SET
                        title = ?1,
                        text = ?2,
                        slug = ?3,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?4
                       AND author_id = ?5
                     RETURNING {NOTE_COLUMNS};"
                ),
                params![title, text, slug, note.id, owner],
                parse_note_row,
            )
            .optional()
            .map_err(|err| map_write_error(err, &slug))?;

        updated.ok_or(RepoError::NoteNotFound(note.id))
    }

    fn delete_note(&self, owner: UserId, note: &Note) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND author_id = ?2;",
            params![note.id, owner],
        )?;
        if changed == 0 {
            return Err(RepoError::NoteNotFound(note.id));
        }
        Ok(())
    }

    fn count_by_slug(&self, slug: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE slug = ?1;",
            [slug],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        slug: row.get("slug")?,
        author_id: row.get("author_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_write_error(err: rusqlite::Error, slug: &str) -> RepoError {
    if is_unique_violation(&err, "notes", "slug") {
        RepoError::DuplicateSlug(slug.to_string())
    } else {
        err.into()
    }
}
