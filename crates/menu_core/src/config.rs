//! Runtime configuration for hosts embedding the catalog core.
//!
//! Values come from `MENU_CORE_*` environment variables with defaults.

use crate::logging::{default_log_level, LogLevel, LoggingError};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "MENU_CORE_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "MENU_CORE_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "MENU_CORE_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "menu_core.sqlite3";

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file holding catalog documents.
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    /// - `UnsupportedLevel` when the level variable holds an unknown level.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_VAR) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_VAR) {
            config.log_level = level.parse()?;
        }
        config.log_dir = read(LOG_DIR_VAR).map(PathBuf::from);
        Ok(config)
    }
}
