//! mongo-env - startup resolver entry point.
//!
//! Startup sequence:
//!   1. Read resolver settings from the host environment
//!   2. Init logger (stderr)
//!   3. Overlay .env (explicit or discovered) on the host environment
//!   4. Resolve the CA bundle path
//!   5. Print MONGO_DB_URL (or `None`) on stdout

use std::io;

use mongo_env::{config, env::Environment, error::AppError, logger, report, resolver};
use tracing::info;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let settings = config::load()?;

    logger::init(&settings.log_level)?;

    let cwd = std::env::current_dir()?;
    let resolution = resolver::resolve(&settings, Environment::from_host(), &cwd)?;

    info!(
        env_file = ?resolution.env_file,
        ca_bundle = ?resolution.ca_bundle,
        url_present = resolution.mongo_db_url().is_some(),
        "resolved"
    );

    let mut out = io::stdout().lock();
    report::write_url(&mut out, resolution.mongo_db_url())?;

    Ok(())
}
