//! HTTP boundary for Notekeeper.
//! Translates requests into identity-scoped core calls and core outcomes
//! into HTML pages, redirects and status codes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod password;
pub mod routes;
pub mod state;
pub mod views;

pub use config::Settings;
pub use error::WebError;
pub use password::Credentials;
pub use routes::router;
pub use state::AppState;

use log::{info, warn};
use tokio::net::TcpListener;

/// Binds `settings.server.bind` and serves until Ctrl-C.
pub async fn serve(state: AppState, settings: &Settings) -> std::io::Result<()> {
    let listener = TcpListener::bind(&settings.server.bind).await?;
    info!(
        "event=server_start module=web status=ok addr={}",
        listener.local_addr()?
    );

    axum::serve(listener, router(state, &settings.session))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=web status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=web status=error error={err}");
    }
}
