//! Context command - show or clear cached lookups

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use sitestack::provider::ContextLookup;

/// Arguments for the context command
#[derive(Parser, Debug, Clone)]
pub struct ContextArgs {
    /// Remove every cached entry
    #[arg(long)]
    pub clear: bool,
}

impl ContextArgs {
    /// Execute the context command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let context = ContextLookup::open(&ctx.config.context_file, None)?;

        if self.clear {
            let removed = context.clear()?;
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({ "cleared": removed }));
            } else {
                println!(
                    "Cleared {} cached {} from {}",
                    removed,
                    if removed == 1 { "entry" } else { "entries" },
                    context.path().display()
                );
            }
            return Ok(0);
        }

        let entries = context.entries();
        if ctx.output.is_json() {
            ctx.output.json(&entries);
            return Ok(0);
        }

        if entries.is_empty() {
            println!("No cached lookups in {}", context.path().display());
            return Ok(0);
        }

        let pairs: Vec<(String, String)> = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        ctx.output.section(&format!("Context ({})", context.path().display()));
        ctx.output.key_values(&pairs);
        ctx.output.hint("Run `sitestack context --clear` to force fresh lookups");
        Ok(0)
    }
}
