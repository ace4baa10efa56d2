//! Deploy command - apply the stacks and publish the site

use super::CommandContext;
use crate::cli::output::StepStatus;
use anyhow::Result;
use chrono::Local;
use clap::Parser;

/// Arguments for the deploy command
#[derive(Parser, Debug, Clone)]
pub struct DeployArgs {
    /// Deploy the stacks only; do not upload content or invalidate
    #[arg(long)]
    pub skip_content: bool,
}

impl DeployArgs {
    /// Execute the deploy command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let site = ctx.assemble_site().await?;
        let assembly = site.synthesize()?;
        assembly.write_to(&ctx.config.output_dir)?;

        ctx.output.banner(&format!("DEPLOY {}", site.domain()));
        ctx.output.info(&format!(
            "Started at {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        for stack in assembly.stacks() {
            ctx.output.stack_header(&stack.name, stack.region_display());
            for binding in &stack.parameters {
                ctx.output
                    .debug(&format!("{} <- {}", binding.parameter, binding.source));
            }
        }
        ctx.output.flush();

        let provisioner = ctx.provisioner().await;
        let report = match provisioner.deploy(&assembly, self.skip_content).await {
            Ok(report) => report,
            Err(e) => {
                ctx.output.summary("Deploy", false);
                return Err(e.into());
            }
        };

        if ctx.output.is_json() {
            ctx.output.json(&report);
            return Ok(0);
        }

        for name in report.stacks.keys() {
            ctx.output.step(name, StepStatus::Deployed, None);
        }
        match (&report.upload, &report.invalidation_id) {
            (Some(upload), Some(invalidation)) => {
                ctx.output.step(
                    site.deployment().id(),
                    StepStatus::Deployed,
                    Some(&format!(
                        "{} uploaded, {} unchanged, {} pruned; invalidation {}",
                        upload.uploaded, upload.skipped, upload.deleted, invalidation
                    )),
                );
            }
            _ => ctx
                .output
                .step(site.deployment().id(), StepStatus::Skipped, None),
        }

        if let Some(outputs) = report.site_outputs() {
            ctx.output.section("Outputs");
            let pairs: Vec<(String, String)> = outputs
                .iter()
                .map(|(k, v)| (format!("{}.{}", site.stack_name(), k), v.clone()))
                .collect();
            ctx.output.key_values(&pairs);
        }

        ctx.output.summary("Deploy", true);
        Ok(0)
    }
}
