//! HTTP mapping of failures.
//!
//! # Responsibility
//! - Turn service outcomes into the response a browser should see.
//!
//! # Invariants
//! - An unauthenticated caller is redirected to login, never shown 404/500.
//! - A hidden note and a missing note render the same 404 page.
//! - Infrastructure failures are logged and shown as a generic 500 page.

use crate::views;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use log::error;
use notekeeper_core::{Denial, NoteServiceError, RepoError};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::{Display, Formatter};

pub const LOGIN_PATH: &str = "/auth/login/";

/// Characters escaped in the `next` query value. `/` stays readable.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Request failure rendered by [`IntoResponse`].
#[derive(Debug)]
pub enum WebError {
    /// Redirect to login, then back to `next`.
    LoginRequired { next: String },
    NotFound,
    Internal(String),
}

impl WebError {
    /// Login redirect that returns to `uri` afterwards.
    pub fn login_required(uri: &Uri) -> Self {
        let next = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        Self::LoginRequired {
            next: next.to_string(),
        }
    }

    pub fn from_denial(denial: Denial, uri: &Uri) -> Self {
        match denial {
            Denial::Unauthenticated => Self::login_required(uri),
            Denial::NotFound => Self::NotFound,
        }
    }

    /// Maps a note service failure that the handler does not recover from.
    pub fn from_service(err: NoteServiceError, uri: &Uri) -> Self {
        match err {
            NoteServiceError::Unauthenticated => Self::login_required(uri),
            NoteServiceError::NotFound => Self::NotFound,
            NoteServiceError::Invalid(_) | NoteServiceError::Repo(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl Display for WebError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoginRequired { next } => write!(f, "login required for `{next}`"),
            Self::NotFound => write!(f, "not found"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<RepoError> for WebError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::LoginRequired { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::NotFound => views::not_found(),
            Self::Internal(message) => {
                error!("event=request_failed module=web status=error error={message}");
                views::server_error()
            }
        }
    }
}

/// `/auth/login/?next=<encoded next>`.
pub fn login_url(next: &str) -> String {
    format!(
        "{LOGIN_PATH}?next={}",
        utf8_percent_encode(next, NEXT_ENCODE_SET)
    )
}

/// Post-login target: `next` if it is a local path, `/` otherwise.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

/// Same-origin absolute path: no scheme, no authority, nothing a browser
/// would strip or reinterpret before resolving it.
fn is_local_path(path: &str) -> bool {
    if !path.starts_with('/') || path.starts_with("//") {
        return false;
    }
    if path
        .chars()
        .any(|ch| ch == '\\' || ch.is_control() || ch.is_whitespace())
    {
        return false;
    }
    match path.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}
