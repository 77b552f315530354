//! Immutable view of the process environment with a non-destructive
//! `.env` overlay.
//!
//! The host environment is captured once into an [`Environment`]; the env
//! file is merged on top of it without ever replacing a key that is already
//! present. Nothing here touches the real process environment.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
};

use tracing::{debug, warn};

use crate::error::AppError;

/// A name → value mapping, frozen after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

/// Counters from a single overlay pass, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStats {
    pub inserted: usize,
    pub kept_existing: usize,
    pub malformed: usize,
}

impl Environment {
    /// Snapshot the host process environment. Entries whose name or value is
    /// not valid UTF-8 are dropped.
    pub fn from_host() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of `key`, or `None` when absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Overlay the env file at `path`.
    ///
    /// A missing file is a no-op. A file that exists but cannot be opened or
    /// read fails with [`AppError::EnvFile`] and no partial overlay is
    /// returned.
    pub fn overlay_file(self, path: &Path) -> Result<(Self, OverlayStats), AppError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "env file not found, skipping");
                return Ok((self, OverlayStats::default()));
            }
            Err(source) => {
                return Err(AppError::EnvFile {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        self.overlay_reader(file, path)
    }

    /// Overlay dotenv-formatted entries read from `reader`. `origin` is only
    /// used for diagnostics.
    ///
    /// Within the file the last definition of a key wins; the merged entries
    /// then fill only keys absent before the overlay. `${VAR}` substitution
    /// is done by dotenvy against the process environment first, then earlier
    /// lines of the same file.
    pub fn overlay_reader<R: Read>(
        mut self,
        reader: R,
        origin: &Path,
    ) -> Result<(Self, OverlayStats), AppError> {
        let mut stats = OverlayStats::default();
        let mut from_file = BTreeMap::new();

        for item in dotenvy::from_read_iter(reader) {
            match item {
                Ok((key, value)) => {
                    from_file.insert(key, value);
                }
                // The underlying line reader repeats a persistent I/O error
                // forever, so bail on the first one.
                Err(dotenvy::Error::Io(source)) => {
                    return Err(AppError::EnvFile {
                        path: origin.to_path_buf(),
                        source,
                    });
                }
                Err(e) => {
                    stats.malformed += 1;
                    warn!(path = %origin.display(), error = %e, "skipping malformed env file line");
                }
            }
        }

        for (key, value) in from_file {
            if self.vars.contains_key(&key) {
                stats.kept_existing += 1;
            } else {
                self.vars.insert(key, value);
                stats.inserted += 1;
            }
        }

        debug!(
            path = %origin.display(),
            inserted = stats.inserted,
            kept_existing = stats.kept_existing,
            malformed = stats.malformed,
            "env file overlaid"
        );
        Ok((self, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use tempfile::{NamedTempFile, TempDir};

    fn write_env(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk fault"))
        }
    }

    #[test]
    fn file_entries_are_added() {
        let f = write_env("MONGO_DB_URL=mongodb://fromfile/db\nOTHER=1\n");
        let (env, stats) = Environment::default().overlay_file(f.path()).unwrap();
        assert_eq!(env.get("MONGO_DB_URL"), Some("mongodb://fromfile/db"));
        assert_eq!(env.get("OTHER"), Some("1"));
        assert_eq!(stats.inserted, 2);
    }

    #[test]
    fn existing_keys_are_never_overwritten() {
        let host = Environment::from_pairs([("MONGO_DB_URL", "mongodb://host/db")]);
        let f = write_env("MONGO_DB_URL=mongodb://fromfile/db\n");
        let (env, stats) = host.overlay_file(f.path()).unwrap();
        assert_eq!(env.get("MONGO_DB_URL"), Some("mongodb://host/db"));
        assert_eq!(stats.kept_existing, 1);
        assert_eq!(stats.inserted, 0);
    }

    #[test]
    fn overlay_is_idempotent() {
        let host = Environment::from_pairs([("A", "host")]);
        let f = write_env("A=file\nB=file\n");
        let (once, _) = host.clone().overlay_file(f.path()).unwrap();
        let (twice, second) = once.clone().overlay_file(f.path()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(second.inserted, 0);
    }

    #[test]
    fn comments_blanks_quotes_and_export_are_understood() {
        let f = write_env(
            "# local defaults\n\nQUOTED=\"mongodb://q/db\"\nSINGLE='x y'\nexport EXPORTED=yes\n",
        );
        let (env, stats) = Environment::default().overlay_file(f.path()).unwrap();
        assert_eq!(stats.inserted, 3);
        assert_eq!(env.get("QUOTED"), Some("mongodb://q/db"));
        assert_eq!(env.get("SINGLE"), Some("x y"));
        assert_eq!(env.get("EXPORTED"), Some("yes"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let f = write_env("GOOD=1\nthis line is not valid\nALSO_GOOD=2\n");
        let (env, _) = Environment::default().overlay_file(f.path()).unwrap();
        assert_eq!(env.get("GOOD"), Some("1"));
        assert_eq!(env.get("ALSO_GOOD"), Some("2"));
    }

    #[test]
    fn missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let host = Environment::from_pairs([("K", "v")]);
        let (env, stats) = host.clone().overlay_file(&dir.path().join(".env")).unwrap();
        assert_eq!(env, host);
        assert_eq!(stats, OverlayStats::default());
    }

    #[test]
    fn read_failure_is_env_file_error() {
        let result = Environment::default().overlay_reader(FailingReader, Path::new(".env"));
        match result {
            Err(AppError::EnvFile { path, .. }) => assert_eq!(path, Path::new(".env")),
            other => panic!("expected EnvFile error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn directory_in_place_of_file_is_env_file_error() {
        let dir = TempDir::new().unwrap();
        let result = Environment::default().overlay_file(dir.path());
        assert!(matches!(result, Err(AppError::EnvFile { .. })));
    }

    #[test]
    fn later_duplicate_in_file_wins() {
        let f = write_env("MONGO_DB_URL=mongodb://first/db\nMONGO_DB_URL=mongodb://second/db\n");
        let (env, stats) = Environment::default().overlay_file(f.path()).unwrap();
        assert_eq!(env.get("MONGO_DB_URL"), Some("mongodb://second/db"));
        assert_eq!(
            stats,
            OverlayStats {
                inserted: 1,
                kept_existing: 0,
                malformed: 0
            }
        );
    }

    #[test]
    fn duplicate_in_file_still_yields_to_host() {
        let host = Environment::from_pairs([("MONGO_DB_URL", "mongodb://host/db")]);
        let f = write_env("MONGO_DB_URL=mongodb://first/db\nMONGO_DB_URL=mongodb://second/db\n");
        let (env, stats) = host.overlay_file(f.path()).unwrap();
        assert_eq!(env.get("MONGO_DB_URL"), Some("mongodb://host/db"));
        assert_eq!(stats.kept_existing, 1);
    }

    #[test]
    fn substitution_uses_earlier_file_lines() {
        let f = write_env(
            "MONGO_ENV_TEST_HOST_PART=db.internal:27017\nMONGO_DB_URL=mongodb://${MONGO_ENV_TEST_HOST_PART}/db\n",
        );
        let (env, _) = Environment::default().overlay_file(f.path()).unwrap();
        assert_eq!(env.get("MONGO_DB_URL"), Some("mongodb://db.internal:27017/db"));
    }

    #[test]
    fn substitution_of_undefined_variable_is_empty() {
        let f = write_env("MONGO_DB_URL=mongodb://${MONGO_ENV_TEST_NEVER_DEFINED}/db\n");
        let (env, _) = Environment::default().overlay_file(f.path()).unwrap();
        assert_eq!(env.get("MONGO_DB_URL"), Some("mongodb:///db"));
    }

    #[test]
    fn absent_key_is_none() {
        let env = Environment::from_pairs([("A", "1")]);
        assert_eq!(env.get("MONGO_DB_URL"), None);
    }

    #[test]
    fn host_snapshot_matches_process_environment() {
        let env = Environment::from_host();
        for (k, v) in std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        {
            assert_eq!(env.get(&k), Some(v.as_str()));
        }
    }
}
