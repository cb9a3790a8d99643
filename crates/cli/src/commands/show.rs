// `vaultkit show`: print a workspace's current configuration.

use clap::Args;
use vaultkit_common::workspace::WorkspaceState;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Workspace identifier.
    workspace: String,
}

pub fn run(args: ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let state = ctx.engine.get_workspace(&args.workspace)?;
    output::print_output(ctx.format, &state, format_human)?;
    Ok(())
}

fn format_human(state: &WorkspaceState) -> String {
    let join = |items: &std::collections::BTreeSet<String>| {
        if items.is_empty() {
            "-".to_owned()
        } else {
            items.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };

    [
        format!("Workspace {} (revision {})", state.workspace_id, state.revision),
        format!("  folders: {}", join(&state.folders)),
        format!("  labels: {}", join(&state.labels)),
        format!("  label rules: {}", state.label_rules.len()),
        format!("  request templates: {}", state.request_templates.len()),
        format!("  share presets: {}", state.share_presets.len()),
        format!("  kpis: {}", join(&state.ui_hints.kpis)),
        format!("  quick actions: {}", join(&state.ui_hints.quick_actions)),
        format!("  checklist: {}", join(&state.ui_hints.checklist)),
    ]
    .join("\n")
}
