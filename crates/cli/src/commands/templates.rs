// `vaultkit templates`: list catalog templates.

use clap::Args;
use serde::Serialize;
use vaultkit_common::template::TemplateSummary;
use vaultkit_common::types::Vertical;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    /// Only list templates for this vertical (business or personal).
    #[arg(long)]
    vertical: Option<Vertical>,
}

#[derive(Debug, Serialize)]
pub struct TemplatesResult {
    pub templates: Vec<TemplateSummary>,
}

pub fn run(args: TemplatesArgs, ctx: &Context) -> anyhow::Result<()> {
    let result = TemplatesResult { templates: ctx.engine.list_templates(args.vertical) };
    output::print_output(ctx.format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &TemplatesResult) -> String {
    if result.templates.is_empty() {
        return "No templates in catalog.".into();
    }

    let mut lines = vec![format!("{} template(s)", result.templates.len())];
    for t in &result.templates {
        lines.push(format!(
            "  {} v{} [{}] {}: {} folder(s), {} label(s), {} ordered item(s)",
            t.id, t.version, t.vertical, t.title, t.folder_count, t.label_count, t.ordered_item_count
        ));
    }
    lines.join("\n")
}
