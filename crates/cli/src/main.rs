// vaultkit CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vaultkit_engine::{EngineConfig, InstallEngine};

mod commands;
mod exit_code;
mod output;

use exit_code::ExitCode;
use output::OutputFormat;

const LOG_FILTER_ENV: &str = "VAULTKIT_LOG_FILTER";
const DEFAULT_CLI_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "vaultkit", about = "Install and roll back workspace starter kits")]
struct Cli {
    /// Engine config file (defaults to ~/.vaultkit/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overriding the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    let format = OutputFormat::detect(cli.json);

    let filter = std::env::var(LOG_FILTER_ENV)
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_CLI_LOG_FILTER));
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            output::print_anyhow_error(format, &error);
            return ExitCode::Error.into();
        }
    };
    tracing::debug!(
        database = %config.database_path.display(),
        catalog_dir = ?config.catalog_dir,
        "opening install engine"
    );
    let engine = match InstallEngine::open(&config) {
        Ok(engine) => engine,
        Err(error) => {
            output::print_anyhow_error(format, &error);
            return ExitCode::Store.into();
        }
    };

    match commands::run(cli.command, &commands::Context { engine, format }) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            output::print_anyhow_error(format, &error);
            ExitCode::from_error(&error).into()
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config =
        EngineConfig::load(cli.config.as_deref()).context("failed to load vaultkit config")?;
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn db_flag_overrides_config_file() {
        let dir = TempDir::new().expect("temp dir");
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "database_path = \"/var/lib/vaultkit/from-file.db\"\n")
            .expect("write config");

        let cli = Cli::parse_from([
            "vaultkit",
            "--config",
            config_path.to_str().expect("utf8 path"),
            "--db",
            "/tmp/override.db",
            "templates",
        ]);
        let config = load_config(&cli).expect("config loads");
        assert_eq!(config.database_path, PathBuf::from("/tmp/override.db"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let cli = Cli::parse_from(["vaultkit", "--config", "/nonexistent/vaultkit.toml", "templates"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn rollback_requires_valid_install_id() {
        assert!(Cli::try_parse_from(["vaultkit", "rollback", "not-a-uuid"]).is_err());
        assert!(Cli::try_parse_from([
            "vaultkit",
            "rollback",
            "00000000-0000-4000-8000-000000000000"
        ])
        .is_ok());
    }
}
