//! Login, signup and logout.
//!
//! # Invariants
//! - Passwords are hashed and verified off the async runtime threads.
//! - Login only redirects to local paths.
//! - Usernames and passwords are never logged.

use crate::error::{safe_next, WebError, LOGIN_PATH};
use crate::identity::{log_in, log_out};
use crate::password::PASSWORD_MIN_CHARS;
use crate::state::AppState;
use crate::views;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use log::info;
use notekeeper_core::model::user::normalize_username;
use notekeeper_core::{RepoError, UserRepository};
use serde::Deserialize;
use tower_sessions::Session;

const INVALID_LOGIN_MESSAGE: &str =
    "Please enter a correct username and password. Both fields may be case-sensitive.";
const DUPLICATE_USERNAME_MESSAGE: &str = "A user with that username already exists.";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Response {
    views::login_form(query.next.as_deref(), "", None)
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let user = state
        .with_users(|users| users.find_by_username(&form.username))
        .await?;

    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    let verified = check_password(&state, &form.password, stored_hash).await?;

    match user {
        Some(user) if verified => {
            log_in(&session, user.id).await?;
            info!("event=login module=web status=ok user_id={}", user.id);
            Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
        }
        _ => {
            info!("event=login module=web status=rejected");
            Ok(views::login_form(
                form.next.as_deref(),
                &form.username,
                Some(INVALID_LOGIN_MESSAGE),
            ))
        }
    }
}

pub async fn signup_form() -> Response {
    views::signup_form("", &[])
}

pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    let mut errors = check_signup(&form);
    if !errors.is_empty() {
        return Ok(views::signup_form(&form.username, &errors));
    }

    let password_hash = hash_password(&state, &form.password1).await?;
    match state
        .with_users(|users| users.create_user(&form.username, &password_hash))
        .await
    {
        Ok(user) => {
            info!("event=signup module=web status=ok user_id={}", user.id);
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
        Err(RepoError::DuplicateUsername(_)) => {
            info!("event=signup module=web status=rejected reason=duplicate_username");
            errors.push(("username", DUPLICATE_USERNAME_MESSAGE.to_string()));
            Ok(views::signup_form(&form.username, &errors))
        }
        Err(RepoError::UserValidation(err)) => {
            errors.push(("username", err.to_string()));
            Ok(views::signup_form(&form.username, &errors))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(session: Session) -> Result<Response, WebError> {
    log_out(&session).await?;
    Ok(views::logged_out())
}

fn check_signup(form: &SignupForm) -> Vec<(&'static str, String)> {
    let mut errors = Vec::new();
    if let Err(err) = normalize_username(&form.username) {
        errors.push(("username", err.to_string()));
    }

    let password = form.password1.as_str();
    if password.chars().count() < PASSWORD_MIN_CHARS {
        errors.push((
            "password1",
            format!("This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."),
        ));
    } else if password.chars().all(|ch| ch.is_ascii_digit()) {
        errors.push(("password1", "This password is entirely numeric.".to_string()));
    }
    if password != form.password2 {
        errors.push(("password2", "The two password fields didn't match.".to_string()));
    }
    errors
}

async fn hash_password(state: &AppState, password: &str) -> Result<String, WebError> {
    let credentials = state.credentials().clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || credentials.hash_password(&password))
        .await
        .map_err(|err| WebError::Internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| WebError::Internal(format!("password hashing failed: {err}")))
}

/// Verifies `password` against `stored_hash`, or against a throwaway hash
/// when the user does not exist.
async fn check_password(
    state: &AppState,
    password: &str,
    stored_hash: Option<String>,
) -> Result<bool, WebError> {
    let credentials = state.credentials().clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => credentials.verify_password(&password, &hash),
        None => credentials.verify_unknown_user(&password),
    })
    .await
    .map_err(|err| WebError::Internal(format!("password check task failed: {err}")))?
    .map_err(|err| WebError::Internal(format!("password check failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{check_signup, SignupForm};

    fn form(username: &str, password1: &str, password2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
        }
    }

    fn fields(form: &SignupForm) -> Vec<&'static str> {
        check_signup(form).into_iter().map(|(field, _)| field).collect()
    }

    #[test]
    fn accepts_a_valid_signup() {
        assert!(fields(&form("alice", "long enough", "long enough")).is_empty());
    }

    #[test]
    fn reports_each_bad_field() {
        assert_eq!(fields(&form("bad name", "short", "other")), vec!["username", "password1", "password2"]);
        assert_eq!(fields(&form("bob", "12345678", "12345678")), vec!["password1"]);
    }
}
