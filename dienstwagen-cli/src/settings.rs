//! Settings file handling.
//!
//! Values are resolved in three layers: command-line flags win over the
//! settings file, which wins over the built-in defaults.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "dienstwagen.db"
//!
//! [logging]
//! level = "info"
//! file = "dienstwagen.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use dienstwagen_core::db::DbConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cli::GlobalArgs;

pub const DEFAULT_SETTINGS_PATH: &str = "./dienstwagen.toml";
pub const DEFAULT_BACKEND: &str = "sqlite";
pub const DEFAULT_DATABASE: &str = "dienstwagen.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// A level or any `EnvFilter` directive.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub db: DbConfig,
    pub log_level: String,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_toml_str(
        path: &Path,
        text: &str,
    ) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &text)
    }

    /// Loads the file named by `--config`, which must exist, or the default
    /// settings file when it exists. Otherwise every value is a default.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_SETTINGS_PATH);
        if default_path.is_file() {
            debug!(path = %default_path.display(), "using default settings file");
            return Self::load(default_path);
        }
        Ok(Self::default())
    }

    pub fn resolve(
        &self,
        args: &GlobalArgs,
    ) -> RuntimeConfig {
        let pick = |flag: &Option<String>, file: &Option<String>, default: &str| {
            flag.clone()
                .or_else(|| file.clone())
                .unwrap_or_else(|| default.to_string())
        };

        RuntimeConfig {
            db: DbConfig {
                backend: pick(&args.backend, &self.database.backend, DEFAULT_BACKEND),
                connection_string: pick(
                    &args.db,
                    &self.database.connection_string,
                    DEFAULT_DATABASE,
                ),
            },
            log_level: self
                .logging
                .level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            verbose: args.verbose,
            log_file: args.log_file.clone().or_else(|| self.logging.file.clone()),
        }
    }
}
