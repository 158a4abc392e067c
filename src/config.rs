//! Runtime configuration loaded from the environment.
//!
//! Values come from `FILEASSERT_*` variables, after an optional `.env` file
//! in the working directory has been loaded.

use std::path::PathBuf;
use std::time::Duration;

/// Default read retry budget.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(4000);
/// Default write transport timeout.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Default delay between read attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Settings shared by every command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory for relative file paths.
    pub project_root: PathBuf,
    /// Retry budget for `readFile` assertions when the caller gives none.
    pub command_timeout: Duration,
    /// How long a single `writeFile` backend call may take.
    pub write_timeout: Duration,
    /// Delay between read attempts.
    pub retry_interval: Duration,
    /// When set, port interactions are recorded to cassettes in this directory.
    pub record_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            record_dir: None,
        }
    }
}

impl Config {
    /// Loads `.env` (if present) and reads configuration from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration variable is not a whole number.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        if config.project_root == PathBuf::from(".") {
            if let Ok(cwd) = std::env::current_dir() {
                config.project_root = cwd;
            }
        }
        Ok(config)
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration variable is not a whole number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
            }
        };

        Ok(Self {
            project_root: lookup("FILEASSERT_PROJECT_ROOT")
                .map_or(defaults.project_root, PathBuf::from),
            command_timeout: millis("FILEASSERT_COMMAND_TIMEOUT_MS", defaults.command_timeout)?,
            write_timeout: millis("FILEASSERT_WRITE_TIMEOUT_MS", defaults.write_timeout)?,
            retry_interval: millis("FILEASSERT_RETRY_INTERVAL_MS", defaults.retry_interval)?,
            record_dir: lookup("FILEASSERT_RECORD").filter(|v| !v.is_empty()).map(PathBuf::from),
        })
    }
}
