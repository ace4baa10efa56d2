//! External seams: zone lookup, stack provisioning and content publishing.
//!
//! The assembler and provisioner only see these traits. AWS implementations
//! live in the submodules; tests substitute in-memory fakes.

pub mod assets;
pub mod aws;
pub mod cloudformation;
pub mod context;
pub mod publish;
pub mod route53;

pub use cloudformation::CloudFormationEngine;
pub use context::ContextLookup;
pub use publish::AwsContentPublisher;
pub use route53::Route53ZoneLookup;

use crate::assembly::StackArtifact;
use crate::error::Result;
use crate::resources::{BucketDeployment, HostedZone, ZoneQuery};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outputs of a deployed stack, by output key
pub type StackOutputs = IndexMap<String, String>;

/// Resolves existing hosted zones
#[async_trait]
pub trait ZoneLookup: Send + Sync {
    /// Find the zone matching `query`; `Ok(None)` when none matches
    async fn find_zone(&self, query: &ZoneQuery) -> Result<Option<HostedZone>>;
}

/// Applies and removes stacks
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Create or update `stack` with `parameters`, wait for it to settle and
    /// return its outputs
    async fn deploy_stack(
        &self,
        stack: &StackArtifact,
        parameters: &IndexMap<String, String>,
    ) -> Result<StackOutputs>;

    /// Delete `stack` and wait for the deletion to finish
    async fn destroy_stack(&self, stack: &StackArtifact) -> Result<()>;

    /// The template currently deployed for `stack`, if it exists
    async fn current_template(&self, stack: &StackArtifact) -> Result<Option<serde_json::Value>>;
}

/// Result of one content sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Objects written
    pub uploaded: usize,
    /// Objects already up to date
    pub skipped: usize,
    /// Remote objects pruned
    pub deleted: usize,
    /// Bytes written
    pub bytes: u64,
}

/// Pushes site content and purges caches
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Sync the deployment's asset directory into `bucket`
    async fn upload(&self, deployment: &BucketDeployment, bucket: &str) -> Result<UploadSummary>;

    /// Delete every object in `bucket` so its stack can remove it; returns
    /// the number of objects deleted. A missing bucket counts as empty.
    async fn empty_bucket(&self, bucket: &str) -> Result<usize>;

    /// Invalidate `paths` on the distribution; returns the invalidation id
    async fn invalidate(&self, distribution_id: &str, paths: &[String]) -> Result<String>;
}
