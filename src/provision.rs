//! Deploy, destroy and diff a cloud assembly.
//!
//! Stacks are applied one at a time in assembly order. Before a stack is
//! deployed, each of its parameter bindings is resolved from the outputs of
//! stacks deployed earlier in the same run; a binding that points at a stack
//! not yet deployed, or at an output that stack did not produce, stops the
//! run with a dependency-ordering error.

use crate::assembly::{CloudAssembly, StackArtifact};
use crate::diff::{diff_templates, TemplateDiff};
use crate::error::{Error, Result};
use crate::provider::{ContentPublisher, ProvisioningEngine, StackOutputs, UploadSummary};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const BUCKET_TYPE: &str = "AWS::S3::Bucket";

/// Outcome of a deploy
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeployReport {
    /// Outputs of each stack, in deploy order
    pub stacks: IndexMap<String, StackOutputs>,
    /// Content sync result, absent when content publishing was skipped
    pub upload: Option<UploadSummary>,
    /// Invalidation id, absent when content publishing was skipped
    pub invalidation_id: Option<String>,
}

impl DeployReport {
    /// Outputs of the last stack deployed (the site stack)
    pub fn site_outputs(&self) -> Option<&StackOutputs> {
        self.stacks.values().last()
    }
}

/// Drives the provisioning engine and content publisher
pub struct Provisioner {
    engine: Arc<dyn ProvisioningEngine>,
    publisher: Arc<dyn ContentPublisher>,
}

impl Provisioner {
    /// Create a provisioner
    pub fn new(engine: Arc<dyn ProvisioningEngine>, publisher: Arc<dyn ContentPublisher>) -> Self {
        Self { engine, publisher }
    }

    fn resolve_parameters(
        stack: &StackArtifact,
        deployed: &IndexMap<String, StackOutputs>,
    ) -> Result<IndexMap<String, String>> {
        for dependency in &stack.dependencies {
            if !deployed.contains_key(dependency) {
                return Err(Error::DependencyOrder {
                    stack: stack.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        let mut parameters = IndexMap::new();
        for binding in &stack.parameters {
            let outputs =
                deployed
                    .get(&binding.source.stack)
                    .ok_or_else(|| Error::DependencyOrder {
                        stack: stack.name.clone(),
                        dependency: binding.source.stack.clone(),
                    })?;
            let value = outputs
                .get(&binding.source.output)
                .ok_or_else(|| Error::MissingOutput {
                    stack: binding.source.stack.clone(),
                    output: binding.source.output.clone(),
                })?;
            parameters.insert(binding.parameter.clone(), value.clone());
        }
        Ok(parameters)
    }

    /// Deploy every stack in order, then publish content unless `skip_content`
    pub async fn deploy(&self, assembly: &CloudAssembly, skip_content: bool) -> Result<DeployReport> {
        let mut report = DeployReport::default();

        for stack in assembly.stacks() {
            let parameters = Self::resolve_parameters(stack, &report.stacks)?;
            info!(
                "Deploying stack {} ({} parameters)",
                stack.name,
                parameters.len()
            );
            let outputs = self.engine.deploy_stack(stack, &parameters).await?;
            report.stacks.insert(stack.name.clone(), outputs);
        }

        if skip_content {
            info!("Skipping content publish");
            return Ok(report);
        }

        let deployment = assembly.deployment();
        let distribution_ref = deployment.distribution();
        let distribution_id = report
            .stacks
            .get(&distribution_ref.stack)
            .ok_or_else(|| Error::DependencyOrder {
                stack: deployment.id().to_string(),
                dependency: distribution_ref.stack.clone(),
            })?
            .get(&distribution_ref.output)
            .ok_or_else(|| Error::MissingOutput {
                stack: distribution_ref.stack.clone(),
                output: distribution_ref.output.clone(),
            })?
            .clone();

        let summary = self
            .publisher
            .upload(deployment, deployment.destination_bucket())
            .await?;
        info!(
            "Uploaded {} objects ({} bytes), {} unchanged, {} pruned",
            summary.uploaded, summary.bytes, summary.skipped, summary.deleted
        );

        let invalidation_id = self
            .publisher
            .invalidate(&distribution_id, deployment.invalidation_paths())
            .await?;

        report.upload = Some(summary);
        report.invalidation_id = Some(invalidation_id);
        Ok(report)
    }

    /// Destroy every stack in reverse order, returning the names destroyed.
    ///
    /// The content bucket is emptied before the stack that declares it is
    /// deleted; CloudFormation cannot remove a bucket that still holds objects.
    pub async fn destroy(&self, assembly: &CloudAssembly) -> Result<Vec<String>> {
        let mut destroyed = Vec::new();
        for stack in assembly.stacks().iter().rev() {
            if !stack.template.resources_of_type(BUCKET_TYPE).is_empty() {
                let bucket = assembly.deployment().destination_bucket();
                let removed = self.publisher.empty_bucket(bucket).await?;
                info!("Removed {} objects from {}", removed, bucket);
            }
            info!("Destroying stack {}", stack.name);
            self.engine.destroy_stack(stack).await?;
            destroyed.push(stack.name.clone());
        }
        Ok(destroyed)
    }

    /// Diff each stack's deployed template against the synthesized one
    pub async fn diff(&self, assembly: &CloudAssembly) -> Result<Vec<TemplateDiff>> {
        let mut diffs = Vec::with_capacity(assembly.stacks().len());
        for stack in assembly.stacks() {
            let deployed = self.engine.current_template(stack).await?;
            if deployed.is_none() {
                warn!("Stack {} is not deployed yet", stack.name);
            }
            let synthesized = stack.template.to_value()?;
            diffs.push(diff_templates(&stack.name, deployed.as_ref(), &synthesized, 3));
        }
        Ok(diffs)
    }
}
