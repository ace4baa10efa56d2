//! # Sitestack - Static Site Infrastructure on AWS
//!
//! Sitestack declares everything a static website needs on AWS and drives it
//! through CloudFormation:
//!
//! - **Bucket**: S3 website bucket named after the site domain, public read
//! - **Certificate**: ACM certificate validated through DNS, issued in `us-east-1`
//! - **Distribution**: CloudFront in front of the bucket website endpoint
//! - **Alias record**: Route 53 `A` alias from the site domain to the distribution
//! - **Deployment**: local assets synced to the bucket, then `/*` invalidated
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  SiteConfig  │──▶│  assembler  │──▶│  SiteStack   │──▶│  synthesize │
//! └──────────────┘   └─────────────┘   └──────────────┘   └─────────────┘
//!                           │                                    │
//!                           ▼                                    ▼
//!                    ┌─────────────┐                     ┌───────────────┐
//!                    │ ZoneLookup  │                     │ CloudAssembly │
//!                    └─────────────┘                     └───────────────┘
//!                                                                │
//!                                                                ▼
//!                                    ┌─────────────────────────────────────┐
//!                                    │ Provisioner                         │
//!                                    │  ProvisioningEngine (CloudFormation)│
//!                                    │  ContentPublisher (S3 + CloudFront) │
//!                                    └─────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use sitestack::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SiteConfig::new("example.com", "www");
//!     let sdk = load_sdk_config(Some("us-west-2"), None).await;
//!
//!     let site = assemble(&config, &Route53ZoneLookup::new(&sdk)).await?;
//!     let assembly = site.synthesize()?;
//!     assembly.write_to(&config.output_dir)?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod assembler;
pub mod assembly;
pub mod config;
pub mod diff;
pub mod domain;
pub mod error;
pub mod graph;
pub mod provider;
pub mod provision;
pub mod resources;
pub mod template;

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::assembler::{assemble, SiteStack};
    pub use crate::assembly::{CloudAssembly, OutputRef, StackArtifact};
    pub use crate::config::SiteConfig;
    pub use crate::domain::SiteDomain;
    pub use crate::error::{Error, Result};
    pub use crate::graph::ResourceGraph;
    pub use crate::provider::aws::load_sdk_config;
    pub use crate::provider::{
        AwsContentPublisher, CloudFormationEngine, ContentPublisher, ContextLookup,
        ProvisioningEngine, Route53ZoneLookup, ZoneLookup,
    };
    pub use crate::provision::{DeployReport, Provisioner};
    pub use crate::resources::{HostedZone, ZoneQuery, CERTIFICATE_REGION};
    pub use crate::template::Template;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
