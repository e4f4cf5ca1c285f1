//! Data-directory and logging configuration.
//!
//! # Responsibility
//! - Resolve the per-user data directory and the store/log paths under it.
//! - Overlay optional settings from `<data_dir>/config.toml`.
//!
//! # Invariants
//! - The store file is always `<data_dir>/unicli.db`.
//! - Missing config file or missing fields fall back to defaults.

use crate::logging::default_log_level;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "UNICLI_DATA_DIR";
pub const DATABASE_FILE_NAME: &str = "unicli.db";
pub const CONFIG_FILE_NAME: &str = "config.toml";
const DATA_DIR_NAME: &str = ".unicli";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory")]
    NoHomeDir,
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to create directory `{path}`: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

/// On-disk overrides; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    log_level: Option<String>,
    log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Defaults rooted at `data_dir`, ignoring any config file.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            database_path: data_dir.join(DATABASE_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            data_dir,
        }
    }

    /// Resolves the data directory (env override, then `$HOME/.unicli`) and
    /// loads its config file.
    pub fn resolve() -> Result<Self, ConfigError> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };
        Self::load_from(data_dir)
    }

    /// Defaults rooted at `data_dir`, overlaid with `config.toml` if present.
    pub fn load_from(data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::with_data_dir(data_dir);
        let path = config.config_path();
        if !path.exists() {
            return Ok(config);
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&contents)?;

        if let Some(level) = file.log_level.filter(|level| !level.trim().is_empty()) {
            config.log_level = level;
        }
        if let Some(log_dir) = file.log_dir {
            config.log_dir = if log_dir.is_absolute() {
                log_dir
            } else {
                config.data_dir.join(log_dir)
            };
        }
        Ok(config)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    /// Creates the data and log directories.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        create_dir(&self.data_dir)?;
        create_dir(&self.log_dir)
    }
}

/// `$HOME/.unicli`.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(DATA_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

fn create_dir(path: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(path).map_err(|source| ConfigError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
