//! Session-backed request identity.

use crate::error::WebError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use notekeeper_core::{Identity, UserId};
use tower_sessions::Session;

/// Session key holding the logged-in user's id.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// The [`Identity`] of the caller, read from the session.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdentity(pub Identity);

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let user_id = session
            .get::<UserId>(SESSION_USER_ID_KEY)
            .await
            .map_err(|err| WebError::Internal(format!("session read failed: {err}")).into_response())?;
        Ok(Self(Identity::from(user_id)))
    }
}

/// Binds `user_id` to a fresh session id.
pub async fn log_in(session: &Session, user_id: UserId) -> Result<(), WebError> {
    session
        .cycle_id()
        .await
        .map_err(|err| WebError::Internal(format!("session cycle failed: {err}")))?;
    session
        .insert(SESSION_USER_ID_KEY, user_id)
        .await
        .map_err(|err| WebError::Internal(format!("session write failed: {err}")))
}

/// Drops all session data and the session id.
pub async fn log_out(session: &Session) -> Result<(), WebError> {
    session
        .flush()
        .await
        .map_err(|err| WebError::Internal(format!("session flush failed: {err}")))
}
