// `vaultkit rollback`: undo one install.

use clap::Args;
use vaultkit_common::install::RollbackResult;
use vaultkit_common::types::InstallId;
use vaultkit_engine::OrderedRollback;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct RollbackArgs {
    /// Install identifier printed by `vaultkit install`.
    install_id: InstallId,
}

pub fn run(args: RollbackArgs, ctx: &Context) -> anyhow::Result<()> {
    let result = ctx.engine.rollback(args.install_id)?;
    if result.partial.any() {
        let message = partial_message(&result, ctx.engine.ordered_rollback());
        output::print_warning(ctx.format, "PARTIAL_ROLLBACK", &message);
    }
    output::print_output(ctx.format, &result, format_human)?;
    Ok(())
}

fn partial_message(result: &RollbackResult, policy: OrderedRollback) -> String {
    let mut categories = Vec::new();
    if result.partial.label_rules {
        categories.push("label_rules");
    }
    if result.partial.request_templates {
        categories.push("request_templates");
    }
    if result.partial.share_presets {
        categories.push("share_presets");
    }
    let categories = categories.join(", ");
    match policy {
        OrderedRollback::Remove => {
            format!("some appended entries were already removed from {categories}")
        }
        OrderedRollback::Retain => {
            format!("appended entries in {categories} were retained by the ordered_rollback policy")
        }
    }
}

fn format_human(result: &RollbackResult) -> String {
    let r = &result.reverted;
    let mut lines = vec![
        format!("Rolled back {} in {}", result.install_id, result.workspace_id),
        format!("  folders removed: {}", r.folders),
        format!("  labels removed: {}", r.labels),
        format!(
            "  removed: {} label rule(s), {} request template(s), {} share preset(s)",
            r.label_rules, r.request_templates, r.share_presets
        ),
    ];
    if result.ui_hints_retained {
        lines.push("  ui hints kept".into());
    }
    lines.join("\n")
}
