//! User repository contract and SQLite implementation.
//!
//! Stores just enough identity for note ownership: a unique username and an
//! opaque password hash produced by the web layer.

use crate::model::user::{normalize_username, User};
use crate::repo::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait UserRepository {
    fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User> {
        let username = normalize_username(username)?;
        if password_hash.is_empty() {
            return Err(RepoError::InvalidData(
                "password hash must not be empty".to_string(),
            ));
        }

        self.conn
            .query_row(
                "INSERT INTO users (username, password_hash)
                 VALUES (?1, ?2)
                 RETURNING id, username, password_hash;",
                params![username, password_hash],
                parse_user_row,
            )
            .map_err(|err| {
                if is_unique_violation(&err, "users", "username") {
                    RepoError::DuplicateUsername(username.clone())
                } else {
                    err.into()
                }
            })
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1;",
                [username.trim()],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
    })
}
