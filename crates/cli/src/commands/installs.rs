// `vaultkit installs`: list install logs for a workspace.

use clap::Args;
use serde::Serialize;
use vaultkit_common::install::InstallLog;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct InstallsArgs {
    /// Workspace identifier.
    workspace: String,
}

#[derive(Debug, Serialize)]
pub struct InstallsResult {
    pub installs: Vec<InstallLog>,
}

pub fn run(args: InstallsArgs, ctx: &Context) -> anyhow::Result<()> {
    let result = InstallsResult { installs: ctx.engine.list_installs(&args.workspace)? };
    output::print_output(ctx.format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &InstallsResult) -> String {
    if result.installs.is_empty() {
        return "No installs recorded.".into();
    }

    let mut lines = vec![format!("{} install(s)", result.installs.len())];
    for log in &result.installs {
        lines.push(format!(
            "  {}  {} v{}  {}",
            log.install_id,
            log.template_id,
            log.version,
            log.installed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    lines.join("\n")
}
