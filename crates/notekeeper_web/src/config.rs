//! Runtime settings.
//!
//! # Responsibility
//! - Merge built-in defaults, an optional `notekeeper.toml` and
//!   `NOTEKEEPER__*` environment variables into [`Settings`].
//!
//! # Invariants
//! - Later sources override earlier ones: defaults < file < environment.
//! - A missing config file is not an error.

use config::{Config, ConfigError, Environment, File, FileFormat};
use notekeeper_core::default_log_level;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "notekeeper.toml";
const ENV_PREFIX: &str = "NOTEKEEPER";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub secure_cookie: bool,
    /// Idle time after which a session expires.
    pub idle_timeout_minutes: i64,
}

/// Argon2id cost parameters for new password hashes.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordSettings {
    pub memory_kib: u32,
    pub iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub session: SessionSettings,
    pub password: PasswordSettings,
}

impl Settings {
    /// Loads settings from `notekeeper.toml` in the working directory and
    /// the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Same as [`Settings::load`] with an explicit config file path.
    pub fn load_from(config_file: &Path) -> Result<Self, ConfigError> {
        let default_log_dir = std::env::current_dir()
            .map_err(|err| ConfigError::Message(format!("cannot resolve working directory: {err}")))?
            .join("logs");

        let config = Config::builder()
            .set_default("server.bind", "127.0.0.1:8000")?
            .set_default("database.path", "notekeeper.sqlite3")?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.dir", default_log_dir.to_string_lossy().into_owned())?
            .set_default("session.secure_cookie", false)?
            .set_default("session.idle_timeout_minutes", 60 * 24 * 14)?
            .set_default("password.memory_kib", argon2::Params::DEFAULT_M_COST)?
            .set_default("password.iterations", argon2::Params::DEFAULT_T_COST)?
            .add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings.server.bind, "127.0.0.1:8000");
        assert_eq!(settings.database.path.to_str(), Some("notekeeper.sqlite3"));
        assert!(settings.logging.dir.is_absolute());
        assert!(!settings.session.secure_cookie);
        assert_eq!(settings.password.memory_kib, argon2::Params::DEFAULT_M_COST);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notekeeper.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nbind = \"0.0.0.0:9000\"\n\n[session]\nsecure_cookie = true"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.server.bind, "0.0.0.0:9000");
        assert!(settings.session.secure_cookie);
        assert_eq!(settings.database.path.to_str(), Some("notekeeper.sqlite3"));
    }
}
