//! User record used as note author identity.
//!
//! Authentication itself happens outside core; this module only defines
//! what a stored user looks like and which usernames are acceptable.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned user id.
pub type UserId = i64;

pub const USERNAME_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// PHC-format hash; never rendered or logged.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooLong { max: usize, actual: usize },
    /// Allowed: letters, digits and `@ . + - _`.
    InvalidUsernameChar(char),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username is required"),
            Self::UsernameTooLong { max, actual } => {
                write!(f, "username must be at most {max} characters (got {actual})")
            }
            Self::InvalidUsernameChar(ch) => write!(
                f,
                "username may contain only letters, digits and @/./+/-/_ (found `{ch}`)"
            ),
        }
    }
}

impl Error for UserValidationError {}

/// Trims and checks a username.
pub fn normalize_username(username: &str) -> Result<String, UserValidationError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(UserValidationError::EmptyUsername);
    }
    let actual = trimmed.chars().count();
    if actual > USERNAME_MAX_CHARS {
        return Err(UserValidationError::UsernameTooLong {
            max: USERNAME_MAX_CHARS,
            actual,
        });
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|ch| !(ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_')))
    {
        return Err(UserValidationError::InvalidUsernameChar(bad));
    }
    Ok(trimmed.to_string())
}
