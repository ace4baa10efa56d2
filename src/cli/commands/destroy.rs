//! Destroy command - delete the stacks in reverse order

use super::CommandContext;
use crate::cli::output::StepStatus;
use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use std::io::IsTerminal;

/// Arguments for the destroy command
#[derive(Parser, Debug, Clone)]
pub struct DestroyArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl DestroyArgs {
    /// Execute the destroy command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let site = ctx.assemble_site().await?;
        let assembly = site.synthesize()?;

        let names: Vec<String> = assembly
            .stacks()
            .iter()
            .rev()
            .map(|s| s.name.clone())
            .collect();

        if !self.force {
            if !std::io::stdin().is_terminal() {
                ctx.output
                    .error("Refusing to destroy without confirmation on a non-interactive input");
                ctx.output.hint("Pass --force to skip the prompt");
                return Ok(1);
            }

            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Delete stacks {} for {}? The site bucket is emptied and deleted too",
                    names.join(", "),
                    site.domain()
                ))
                .default(false)
                .interact()?;
            if !confirmed {
                ctx.output.warning("Destroy cancelled");
                return Ok(1);
            }
        }

        ctx.output.banner(&format!("DESTROY {}", site.domain()));
        let provisioner = ctx.provisioner().await;
        let destroyed = match provisioner.destroy(&assembly).await {
            Ok(destroyed) => destroyed,
            Err(e) => {
                ctx.output.summary("Destroy", false);
                return Err(e.into());
            }
        };

        if ctx.output.is_json() {
            ctx.output
                .json(&serde_json::json!({ "destroyed": destroyed }));
            return Ok(0);
        }

        for name in &destroyed {
            ctx.output.step(name, StepStatus::Destroyed, None);
        }
        ctx.output.summary("Destroy", true);
        Ok(0)
    }
}
