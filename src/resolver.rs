//! Resolve sequence: locate the env file, overlay it on the host
//! environment, look up the CA bundle, read the connection URL.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    config::{ENV_FILE_NAME, Settings, URL_VAR},
    env::Environment,
    error::AppError,
    trust,
};

/// Outcome of a successful resolve.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Host environment with the env file overlaid.
    pub env: Environment,
    /// Env file that was considered: an explicit `MONGO_ENV_FILE` path is
    /// kept even when missing, a discovered `.env` only when it exists.
    pub env_file: Option<PathBuf>,
    pub ca_bundle: Option<PathBuf>,
}

impl Resolution {
    /// `MONGO_DB_URL` from the resolved environment.
    pub fn mongo_db_url(&self) -> Option<&str> {
        self.env.get(URL_VAR)
    }
}

/// Search `start` and its ancestors for a regular file called `name`.
pub fn find_env_file(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Run the resolve sequence against `host`. `cwd` anchors `.env` discovery
/// and relative explicit paths.
pub fn resolve(settings: &Settings, host: Environment, cwd: &Path) -> Result<Resolution, AppError> {
    let env_file = match &settings.env_file {
        Some(path) if path.is_absolute() => Some(path.clone()),
        Some(path) => Some(cwd.join(path)),
        None => find_env_file(cwd, ENV_FILE_NAME),
    };

    let env = match &env_file {
        Some(path) => {
            let (env, stats) = host.overlay_file(path)?;
            info!(
                path = %path.display(),
                inserted = stats.inserted,
                kept_existing = stats.kept_existing,
                "env file loaded"
            );
            env
        }
        None => {
            debug!(cwd = %cwd.display(), "no env file found");
            host
        }
    };

    let ca_bundle = trust::ca_bundle_path(&env);
    match &ca_bundle {
        Some(path) => debug!(path = %path.display(), "CA bundle resolved"),
        None => debug!("no CA bundle available"),
    }

    let resolution = Resolution {
        env,
        env_file,
        ca_bundle,
    };
    debug!(
        present = resolution.mongo_db_url().is_some(),
        "connection URL resolved"
    );
    Ok(resolution)
}
