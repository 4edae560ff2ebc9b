//! Route table and middleware stack.

use crate::config::SessionSettings;
use crate::error::WebError;
use crate::handlers::{auth, notes};
use crate::state::AppState;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use std::time::Instant;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Builds the application router with an in-memory session store.
pub fn router(state: AppState, sessions: &SessionSettings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(sessions.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            sessions.idle_timeout_minutes,
        )));

    Router::new()
        .route("/", get(notes::home))
        .route("/notes/", get(notes::list))
        .route("/add/", get(notes::add_form).post(notes::add))
        .route("/done/", get(notes::done))
        .route("/note/{slug}/", get(notes::detail))
        .route("/edit/{slug}/", get(notes::edit_form).post(notes::edit))
        .route(
            "/delete/{slug}/",
            get(notes::delete_confirm).post(notes::delete),
        )
        .route("/auth/login/", get(auth::login_form).post(auth::login))
        .route("/auth/signup/", get(auth::signup_form).post(auth::signup))
        .route("/auth/logout/", post(auth::logout))
        .fallback(not_found)
        .layer(session_layer)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn not_found() -> WebError {
    WebError::NotFound
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "event=http_request module=web method={method} path={path} status={} elapsed_ms={}",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
