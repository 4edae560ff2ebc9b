//! Server entry point.
//!
//! # Responsibility
//! - Load settings, start logging, open the database and serve HTTP.
//!
//! Usage: `notekeeper [CONFIG_FILE]` (default `notekeeper.toml`).

use log::info;
use notekeeper_core::db::open_db;
use notekeeper_core::{core_version, init_logging};
use notekeeper_web::{AppState, Credentials, Settings};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("notekeeper: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let settings = match std::env::args_os().nth(1) {
        Some(path) => Settings::load_from(&PathBuf::from(path))?,
        None => Settings::load()?,
    };

    init_logging(&settings.logging.level, &settings.logging.dir)?;
    info!(
        "event=app_start module=cli status=ok version={} db_path={}",
        core_version(),
        settings.database.path.display()
    );

    let conn = open_db(&settings.database.path)?;
    let credentials = Credentials::from_settings(&settings.password)?;
    notekeeper_web::serve(AppState::new(conn, credentials), &settings).await?;
    Ok(())
}
