//! Resolver settings with env-var overrides.
//!
//! Settings come from the host environment only, before any `.env` overlay:
//! `MONGO_ENV_FILE` names an explicit env file and `MONGO_ENV_LOG_LEVEL`
//! sets the log level.

use std::{env, path::PathBuf};

use crate::{error::AppError, logger};

/// Variable the resolver reports.
pub const URL_VAR: &str = "MONGO_DB_URL";
/// Conventional env file name searched for when no explicit path is given.
pub const ENV_FILE_NAME: &str = ".env";
pub const ENV_FILE_VAR: &str = "MONGO_ENV_FILE";
pub const LOG_LEVEL_VAR: &str = "MONGO_ENV_LOG_LEVEL";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Fully-resolved resolver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Explicit env file (already expanded, no `~`). `None` means discover
    /// `.env` from the working directory upwards.
    pub env_file: Option<PathBuf>,
    pub log_level: String,
}

/// Load settings from the host environment.
pub fn load() -> Result<Settings, AppError> {
    let env_file_override = env::var(ENV_FILE_VAR).ok();
    let log_level_override = env::var(LOG_LEVEL_VAR).ok();
    load_from(env_file_override.as_deref(), log_level_override.as_deref())
}

/// Internal loader - tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    env_file_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings, AppError> {
    let env_file = env_file_override
        .filter(|p| !p.is_empty())
        .map(expand_home);

    let log_level = log_level_override
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .trim()
        .to_ascii_lowercase();
    logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("{LOG_LEVEL_VAR}: {e}")))?;

    Ok(Settings {
        env_file,
        log_level,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
