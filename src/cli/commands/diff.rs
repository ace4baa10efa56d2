//! Diff command - compare deployed and synthesized templates

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the diff command
#[derive(Parser, Debug, Clone)]
pub struct DiffArgs {
    /// Exit with status 1 when any stack differs
    #[arg(long)]
    pub fail: bool,
}

impl DiffArgs {
    /// Execute the diff command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let site = ctx.assemble_site().await?;
        let assembly = site.synthesize()?;
        let provisioner = ctx.provisioner().await;
        let diffs = provisioner.diff(&assembly).await?;

        let changed = diffs.iter().filter(|d| d.has_changes()).count();

        if ctx.output.is_json() {
            let stacks: Vec<serde_json::Value> = diffs
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "stack": d.stack,
                        "deployed": d.deployed,
                        "changed": d.has_changes(),
                        "insertions": d.insertions,
                        "deletions": d.deletions,
                        "diff": d.render(false),
                    })
                })
                .collect();
            ctx.output.json(&serde_json::json!({ "stacks": stacks }));
        } else {
            for diff in &diffs {
                let stack = assembly.stack(&diff.stack);
                ctx.output.stack_header(
                    &diff.stack,
                    stack.map(|s| s.region_display()).unwrap_or("(default)"),
                );
                if diff.has_changes() {
                    ctx.output.raw(&diff.render(ctx.output.use_color()));
                } else {
                    ctx.output.raw("There were no differences");
                }
            }
            ctx.output.info(&format!(
                "{} of {} stacks differ",
                changed,
                diffs.len()
            ));
        }

        if self.fail && changed > 0 {
            Ok(1)
        } else {
            Ok(0)
        }
    }
}
