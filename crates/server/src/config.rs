// HTTP server configuration.
//
// Environment variables cover the listener and may override the engine's
// TOML config file.

use std::net::SocketAddr;
use std::path::PathBuf;

use vaultkit_engine::config::{ConfigError, EngineConfig};

/// Core server configuration.
///
/// Constructed via [`ServerConfig::from_env`] which reads environment
/// variables and falls back to development defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (host:port).
    pub listen_addr: SocketAddr,
    /// Engine TOML config; `~/.vaultkit/config.toml` when unset.
    pub config_path: Option<PathBuf>,
    /// Overrides `database_path` from the engine config.
    pub database_path: Option<PathBuf>,
    /// Comma-separated CORS origins (or `"*"` for any).
    pub cors_origins: Option<String>,
    /// Overrides `log_filter` from the engine config.
    pub log_filter: Option<String>,
}

impl ServerConfig {
    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `VAULTKIT_HOST` | `0.0.0.0` |
    /// | `VAULTKIT_PORT` | `8080` |
    /// | `VAULTKIT_CONFIG` | *(none)* |
    /// | `VAULTKIT_DATABASE_PATH` | *(engine config)* |
    /// | `VAULTKIT_CORS_ORIGINS` | *(none; cors.rs uses dev defaults)* |
    /// | `VAULTKIT_LOG_FILTER` | *(engine config, `info`)* |
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    fn from_env_fn<F>(env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let host = env("VAULTKIT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env("VAULTKIT_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
        let listen_addr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));

        let non_empty = |key: &str| env(key).ok().filter(|value| !value.trim().is_empty());

        Self {
            listen_addr,
            config_path: non_empty("VAULTKIT_CONFIG").map(PathBuf::from),
            database_path: non_empty("VAULTKIT_DATABASE_PATH").map(PathBuf::from),
            cors_origins: non_empty("VAULTKIT_CORS_ORIGINS"),
            log_filter: non_empty("VAULTKIT_LOG_FILTER"),
        }
    }

    /// Engine config with the environment overrides applied.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut config = EngineConfig::load(self.config_path.as_deref())?;
        if let Some(database_path) = &self.database_path {
            config.database_path = database_path.clone();
        }
        if let Some(log_filter) = &self.log_filter {
            config.log_filter = log_filter.clone();
        }
        Ok(config)
    }
}
