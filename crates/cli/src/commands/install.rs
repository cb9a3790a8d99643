// `vaultkit install`: install a template into a workspace.

use clap::Args;
use vaultkit_common::install::InstallLog;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Workspace identifier.
    workspace: String,
    /// Template identifier.
    template: String,
    /// Template version (defaults to the latest in the catalog).
    #[arg(long)]
    version: Option<u32>,
}

pub fn run(args: InstallArgs, ctx: &Context) -> anyhow::Result<()> {
    let version = ctx.engine.resolve_version(&args.template, args.version);
    let log = ctx.engine.apply_install(&args.workspace, &args.template, version)?;
    output::print_output(ctx.format, &log, format_human)?;
    Ok(())
}

fn format_human(log: &InstallLog) -> String {
    let created = &log.created_items;
    let mut lines = vec![
        format!(
            "Installed {} v{} into {}",
            log.template_id, log.version, log.workspace_id
        ),
        format!("  install id: {}", log.install_id),
        format!("  folders created: {}", created.folders.len()),
        format!("  labels created: {}", created.labels.len()),
        format!(
            "  appended: {} label rule(s), {} request template(s), {} share preset(s)",
            created.label_rules.len(),
            created.request_templates.len(),
            created.share_presets.len()
        ),
    ];
    if created.is_empty() {
        lines.push("  nothing new; every item already existed".into());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;

    #[test]
    fn human_format_shows_install_id_and_counts() {
        let ctx = test_context();
        let log = ctx.engine.apply_install("org-acme", "starter-vault", 1).expect("install succeeds");
        let output = format_human(&log);
        assert!(output.starts_with("Installed starter-vault v1 into org-acme"));
        assert!(output.contains(&log.install_id.to_string()));
        assert!(output.contains(&format!("folders created: {}", log.created_items.folders.len())));
    }

    #[test]
    fn unknown_template_surfaces_engine_error() {
        let ctx = test_context();
        let args = InstallArgs {
            workspace: "org-acme".into(),
            template: "does-not-exist".into(),
            version: Some(1),
        };
        let err = run(args, &ctx).expect_err("unknown template fails");
        assert_eq!(crate::exit_code::ExitCode::from_error(&err), crate::exit_code::ExitCode::NotFound);
    }
}
