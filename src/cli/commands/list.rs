//! List command - show the stacks in deploy order

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Also list the resources in each stack
    #[arg(short, long)]
    pub long: bool,
}

impl ListArgs {
    /// Execute the list command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let site = ctx.assemble_site().await?;
        let assembly = site.synthesize()?;

        if ctx.output.is_json() {
            let stacks: Vec<serde_json::Value> = assembly
                .stacks()
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.name,
                        "environment": s.environment,
                        "dependencies": s.dependencies,
                        "resources": s.template.resources().keys().collect::<Vec<_>>(),
                    })
                })
                .collect();
            ctx.output.json(&serde_json::json!({ "stacks": stacks }));
            return Ok(0);
        }

        let rows: Vec<Vec<String>> = assembly
            .stacks()
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.region_display().to_string(),
                    if s.dependencies.is_empty() {
                        "-".to_string()
                    } else {
                        s.dependencies.join(", ")
                    },
                    s.template.resources().len().to_string(),
                ]
            })
            .collect();
        ctx.output
            .table(&["Stack", "Region", "Depends on", "Resources"], &rows);

        if self.long {
            for stack in assembly.stacks() {
                let items: Vec<String> = stack
                    .template
                    .resources()
                    .iter()
                    .map(|(id, body)| {
                        let kind = body
                            .get("Type")
                            .and_then(|t| t.as_str())
                            .unwrap_or("?");
                        format!("{} ({})", id, kind)
                    })
                    .collect();
                ctx.output.list(&stack.name, &items);
            }
        }

        Ok(0)
    }
}
