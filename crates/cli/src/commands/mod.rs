// CLI subcommand dispatch.

use clap::Subcommand;
use vaultkit_engine::InstallEngine;

use crate::output::OutputFormat;

pub mod install;
pub mod installs;
pub mod preview;
pub mod rollback;
pub mod show;
pub mod templates;

/// Everything a subcommand needs to run.
pub struct Context {
    pub engine: InstallEngine,
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Command {
    /// List catalog templates
    Templates(templates::TemplatesArgs),
    /// Show which template folders and labels already exist in a workspace
    Preview(preview::PreviewArgs),
    /// Install a template into a workspace
    Install(install::InstallArgs),
    /// Roll back one install
    Rollback(rollback::RollbackArgs),
    /// List install logs for a workspace, newest first
    Installs(installs::InstallsArgs),
    /// Show a workspace's current configuration
    Show(show::ShowArgs),
}

pub fn run(cmd: Command, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        Command::Templates(args) => templates::run(args, ctx),
        Command::Preview(args) => preview::run(args, ctx),
        Command::Install(args) => install::run(args, ctx),
        Command::Rollback(args) => rollback::run(args, ctx),
        Command::Installs(args) => installs::run(args, ctx),
        Command::Show(args) => show::run(args, ctx),
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> Context {
    use std::sync::Arc;
    use vaultkit_engine::{MemoryStore, StaticCatalog};

    let catalog = StaticCatalog::builtin().expect("builtin catalog");
    Context {
        engine: InstallEngine::new(Arc::new(catalog), Arc::new(MemoryStore::new())),
        format: OutputFormat::Json,
    }
}
