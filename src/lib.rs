//! Resolve the MongoDB connection URL from the host environment and an
//! optional `.env` file, alongside the trusted CA bundle path.

pub mod config;
pub mod env;
pub mod error;
pub mod logger;
pub mod report;
pub mod resolver;
pub mod trust;
