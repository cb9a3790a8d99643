// Engine configuration file.
//
// Default location: `~/.vaultkit/config.toml`

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::install::OrderedRollback;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Root directory for vaultkit state: `~/.vaultkit/`.
pub fn vaultkit_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".vaultkit"))
}

/// Path to the default config file: `~/.vaultkit/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    vaultkit_dir().map(|dir| dir.join("config.toml"))
}

fn default_database_path() -> PathBuf {
    vaultkit_dir().unwrap_or_else(|| PathBuf::from(".vaultkit")).join("vaultkit.db")
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// SQLite database holding workspace state and install logs.
    pub database_path: PathBuf,
    /// Directory of extra `*.json` templates loaded next to the built-in kits.
    pub catalog_dir: Option<PathBuf>,
    pub ordered_rollback: OrderedRollback,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            catalog_dir: None,
            ordered_rollback: OrderedRollback::default(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl EngineConfig {
    /// Load from `path`, or from `~/.vaultkit/config.toml` when `path` is
    /// `None`. A missing default file yields defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error in `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
