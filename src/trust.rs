//! Trusted CA bundle lookup.
//!
//! Pure path resolution: nothing is opened, parsed or validated here.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use tracing::debug;

use crate::env::Environment;

/// Standard OpenSSL override for the CA bundle file.
pub const CERT_FILE_VAR: &str = "SSL_CERT_FILE";

/// Cached system probe. Stores `None` when no bundle was found.
static SYSTEM_BUNDLE: OnceLock<Option<PathBuf>> = OnceLock::new();

fn probe_system_bundle() -> Option<PathBuf> {
    let result = openssl_probe::probe();
    match &result.cert_file {
        Some(path) => debug!(path = %path.display(), "found system CA bundle"),
        None => debug!("no system CA bundle found"),
    }
    result.cert_file
}

/// System CA bundle path, probed once per process.
pub fn system_bundle() -> Option<&'static Path> {
    SYSTEM_BUNDLE.get_or_init(probe_system_bundle).as_deref()
}

/// CA bundle path for `env`: a non-empty `SSL_CERT_FILE` wins, otherwise the
/// probed system bundle.
pub fn ca_bundle_path(env: &Environment) -> Option<PathBuf> {
    bundle_from_env(env).or_else(|| system_bundle().map(Path::to_path_buf))
}

fn bundle_from_env(env: &Environment) -> Option<PathBuf> {
    env.get(CERT_FILE_VAR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}
