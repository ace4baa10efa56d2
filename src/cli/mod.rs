//! CLI module for Sitestack
//!
//! This module provides the command-line interface for Sitestack,
//! including argument parsing and subcommand handling.

pub mod commands;
pub mod completions;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sitestack - static websites on S3, CloudFront and Route 53
///
/// Declares the bucket, certificate, distribution and DNS alias for a site,
/// deploys them through CloudFormation and publishes the site content.
#[derive(Parser, Debug, Clone)]
#[command(name = "sitestack")]
#[command(author = "Sitestack Contributors")]
#[command(version)]
#[command(about = "Static website infrastructure on AWS", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "SITESTACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Region the site stack deploys to
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Account the stacks deploy to
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Named AWS profile for credentials
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Never call AWS for lookups; serve them from the context file only
    #[arg(long, global = true)]
    pub no_lookups: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Assemble the site and write the cloud assembly
    Synth(commands::synth::SynthArgs),

    /// Deploy the stacks, publish content and invalidate the cache
    Deploy(commands::deploy::DeployArgs),

    /// Delete the stacks
    Destroy(commands::destroy::DestroyArgs),

    /// Compare deployed templates with freshly synthesized ones
    Diff(commands::diff::DiffArgs),

    /// List the stacks in deploy order
    List(commands::list::ListArgs),

    /// Print the resource dependency graph in DOT format
    Graph(commands::graph::GraphArgs),

    /// Show or clear cached lookups
    Context(commands::context::ContextArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["sitestack", "synth"]).unwrap();
        assert!(matches!(cli.command, Commands::Synth(_)));
        assert_eq!(cli.verbose, 0);
        assert!(!cli.no_lookups);
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["sitestack", "-vvvvv", "list"]).unwrap();
        assert_eq!(cli.verbose, 5);
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sitestack",
            "deploy",
            "--skip-content",
            "--region",
            "ap-southeast-2",
            "--account",
            "123456789012",
            "--no-lookups",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.region.as_deref(), Some("ap-southeast-2"));
        assert_eq!(cli.account.as_deref(), Some("123456789012"));
        assert!(cli.no_lookups);
        assert!(cli.is_json());
        match cli.command {
            Commands::Deploy(args) => assert!(args.skip_content),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_synth_args() {
        let cli =
            Cli::try_parse_from(["sitestack", "synth", "-o", "build/cdk", "--format", "yaml"])
                .unwrap();
        match cli.command {
            Commands::Synth(args) => {
                assert_eq!(args.output_dir, Some(PathBuf::from("build/cdk")));
                assert_eq!(args.format, commands::synth::TemplateFormat::Yaml);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_output_format_rejected() {
        assert!(Cli::try_parse_from(["sitestack", "--output", "xml", "list"]).is_err());
    }
}
