// `vaultkit preview`: dry-run collision report.

use clap::Args;
use serde::Serialize;
use vaultkit_common::install::CollisionReport;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Workspace identifier.
    workspace: String,
    /// Template identifier.
    template: String,
    /// Template version (defaults to the latest in the catalog).
    #[arg(long)]
    version: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResult {
    pub workspace_id: String,
    pub template_id: String,
    pub version: u32,
    pub collisions: CollisionReport,
}

pub fn run(args: PreviewArgs, ctx: &Context) -> anyhow::Result<()> {
    let version = ctx.engine.resolve_version(&args.template, args.version);
    let collisions = ctx.engine.preview_collisions(&args.workspace, &args.template, version)?;
    let result = PreviewResult {
        workspace_id: args.workspace,
        template_id: args.template,
        version,
        collisions,
    };
    output::print_output(ctx.format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &PreviewResult) -> String {
    let header = format!(
        "{} v{} into {}",
        result.template_id, result.version, result.workspace_id
    );
    if result.collisions.is_empty() {
        return format!("{header}: no collisions");
    }

    let mut lines = vec![format!("{header}: existing items will be kept")];
    if !result.collisions.folders.is_empty() {
        lines.push(format!("  folders: {}", result.collisions.folders.join(", ")));
    }
    if !result.collisions.labels.is_empty() {
        lines.push(format!("  labels: {}", result.collisions.labels.join(", ")));
    }
    lines.join("\n")
}
