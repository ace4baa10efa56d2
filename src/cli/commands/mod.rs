//! Subcommands module for Sitestack CLI
//!
//! This module contains all the subcommand implementations.

pub mod context;
pub mod deploy;
pub mod destroy;
pub mod diff;
pub mod graph;
pub mod list;
pub mod synth;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use aws_config::SdkConfig;
use sitestack::assembler::{assemble, SiteStack};
use sitestack::config::SiteConfig;
use sitestack::provider::aws::load_sdk_config;
use sitestack::provider::{
    AwsContentPublisher, CloudFormationEngine, ContextLookup, Route53ZoneLookup, ZoneLookup,
};
use sitestack::provision::Provisioner;
use std::sync::Arc;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration, with CLI overrides applied
    pub config: SiteConfig,
    /// Output formatter
    pub output: OutputFormatter,
    /// Serve lookups from the context file only
    pub no_lookups: bool,
    /// AWS configuration, loaded on first use
    sdk: Option<SdkConfig>,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, mut config: SiteConfig) -> Self {
        let output = OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity());

        if let Some(region) = &cli.region {
            config.env.region = Some(region.clone());
        }
        if let Some(account) = &cli.account {
            config.env.account = Some(account.clone());
        }
        if let Some(profile) = &cli.profile {
            config.env.profile = Some(profile.clone());
        }

        Self {
            config,
            output,
            no_lookups: cli.no_lookups,
            sdk: None,
        }
    }

    /// Shared AWS configuration for the configured region and profile
    pub async fn sdk_config(&mut self) -> SdkConfig {
        if let Some(sdk) = &self.sdk {
            return sdk.clone();
        }

        self.output.debug("Loading AWS configuration");
        let sdk = load_sdk_config(
            self.config.env.region.as_deref(),
            self.config.env.profile.as_deref(),
        )
        .await;
        self.sdk = Some(sdk.clone());
        sdk
    }

    /// Context-cached zone lookup, backed by Route 53 unless lookups are off
    pub async fn zone_lookup(&mut self) -> Result<ContextLookup> {
        let inner: Option<Arc<dyn ZoneLookup>> = if self.no_lookups {
            None
        } else {
            let sdk = self.sdk_config().await;
            Some(Arc::new(Route53ZoneLookup::new(&sdk)))
        };
        Ok(ContextLookup::open(&self.config.context_file, inner)?)
    }

    /// Run the declaration pipeline for the configured site
    pub async fn assemble_site(&mut self) -> Result<SiteStack> {
        let zones = self.zone_lookup().await?;
        self.output.debug(&format!(
            "Assembling {}.{} (context file {}, lookups {})",
            self.config.sub_domain,
            self.config.root_domain,
            zones.path().display(),
            if zones.lookups_enabled() { "on" } else { "off" }
        ));
        Ok(assemble(&self.config, &zones).await?)
    }

    /// Provisioner over CloudFormation, S3 and CloudFront
    pub async fn provisioner(&mut self) -> Provisioner {
        let sdk = self.sdk_config().await;
        let engine = CloudFormationEngine::new(sdk.clone(), self.config.deploy.clone());
        let publisher = AwsContentPublisher::new(&sdk, self.config.deploy.upload_concurrency);
        Provisioner::new(Arc::new(engine), Arc::new(publisher))
    }
}
