//! Synth command - assemble the site and write the cloud assembly

use super::CommandContext;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use sitestack::assembly::CloudAssembly;
use std::path::PathBuf;

/// Format templates are printed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TemplateFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Arguments for the synth command
#[derive(Parser, Debug, Clone)]
pub struct SynthArgs {
    /// Directory to write the cloud assembly to
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Format of the printed templates (files are always JSON)
    #[arg(long, default_value = "json")]
    pub format: TemplateFormat,

    /// Do not print the templates
    #[arg(short, long)]
    pub quiet: bool,
}

impl SynthArgs {
    /// Execute the synth command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let site = ctx.assemble_site().await?;
        let assembly = site.synthesize()?;

        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| ctx.config.output_dir.clone());
        let written = assembly.write_to(&output_dir)?;

        if ctx.output.is_json() {
            ctx.output.json(&serde_json::json!({
                "outputDir": output_dir,
                "files": written,
                "manifest": assembly.manifest(),
            }));
            return Ok(0);
        }

        if !self.quiet {
            print_templates(ctx, &assembly, self.format)?;
        }

        ctx.output.info(&format!(
            "Wrote {} files to {}",
            written.len(),
            output_dir.display()
        ));
        for stack in assembly.stacks() {
            ctx.output.debug(&format!(
                "{} -> {}",
                stack.name,
                output_dir.join(stack.template_file()).display()
            ));
        }

        Ok(0)
    }
}

fn print_templates(
    ctx: &CommandContext,
    assembly: &CloudAssembly,
    format: TemplateFormat,
) -> Result<()> {
    for stack in assembly.stacks() {
        ctx.output.stack_header(&stack.name, stack.region_display());
        let text = match format {
            TemplateFormat::Json => stack.template.to_json()?,
            TemplateFormat::Yaml => stack.template.to_yaml()?,
        };
        ctx.output.raw(&text);
    }
    Ok(())
}
