//! Stack provisioning through CloudFormation.

use super::aws::{describe_error, with_region};
use super::{ProvisioningEngine, StackOutputs};
use crate::assembly::StackArtifact;
use crate::config::DeploySettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::types::{Capability, OnFailure, Parameter, Stack, StackStatus, Tag};
use aws_sdk_cloudformation::Client;
use indexmap::IndexMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const NO_UPDATES: &str = "No updates are to be performed";
const DOES_NOT_EXIST: &str = "does not exist";

/// Where a stack is after a status poll
#[derive(Debug, Clone, PartialEq, Eq)]
enum StackState {
    /// Still converging
    InProgress,
    /// Settled successfully
    Complete,
    /// Settled in a failed state
    Failed(String),
    /// Gone
    Deleted,
}

fn classify(status: &StackStatus, reason: Option<&str>) -> StackState {
    match status {
        StackStatus::CreateComplete
        | StackStatus::UpdateComplete
        | StackStatus::ImportComplete => StackState::Complete,

        StackStatus::DeleteComplete => StackState::Deleted,

        StackStatus::CreateInProgress
        | StackStatus::DeleteInProgress
        | StackStatus::ImportInProgress
        | StackStatus::ImportRollbackInProgress
        | StackStatus::ReviewInProgress
        | StackStatus::RollbackInProgress
        | StackStatus::UpdateCompleteCleanupInProgress
        | StackStatus::UpdateInProgress
        | StackStatus::UpdateRollbackCompleteCleanupInProgress
        | StackStatus::UpdateRollbackInProgress => StackState::InProgress,

        other => StackState::Failed(format!(
            "{}: {}",
            other.as_str(),
            reason.unwrap_or("no reason given")
        )),
    }
}

/// Drives CloudFormation create/update/delete for each stack
pub struct CloudFormationEngine {
    config: SdkConfig,
    settings: DeploySettings,
}

impl CloudFormationEngine {
    /// Create an engine from loaded SDK configuration
    pub fn new(config: SdkConfig, settings: DeploySettings) -> Self {
        Self { config, settings }
    }

    fn client_for(&self, stack: &StackArtifact) -> Client {
        Client::new(&with_region(
            &self.config,
            stack.environment.region.as_deref(),
        ))
    }

    async fn describe(client: &Client, name: &str) -> Result<Option<Stack>> {
        match client.describe_stacks().stack_name(name).send().await {
            Ok(resp) => Ok(resp.stacks().first().cloned()),
            Err(e) => {
                let message = describe_error(&e);
                if message.contains(DOES_NOT_EXIST) {
                    Ok(None)
                } else {
                    Err(Error::stack_deploy(name, message))
                }
            }
        }
    }

    async fn wait_until_settled(&self, client: &Client, name: &str) -> Result<StackState> {
        let started = Instant::now();
        let timeout = Duration::from_secs(self.settings.timeout_mins * 60);
        let interval = Duration::from_secs(self.settings.poll_interval_secs.max(1));

        loop {
            let state = match Self::describe(client, name).await? {
                Some(stack) => match stack.stack_status() {
                    Some(status) => classify(status, stack.stack_status_reason()),
                    None => StackState::InProgress,
                },
                None => StackState::Deleted,
            };

            if state != StackState::InProgress {
                return Ok(state);
            }
            if started.elapsed() > timeout {
                return Err(Error::stack_deploy(
                    name,
                    format!("timed out after {} minutes", self.settings.timeout_mins),
                ));
            }

            debug!("Stack {} still in progress", name);
            tokio::time::sleep(interval).await;
        }
    }

    fn read_outputs(stack: &Stack) -> StackOutputs {
        let mut outputs = IndexMap::new();
        for output in stack.outputs() {
            if let (Some(key), Some(value)) = (output.output_key(), output.output_value()) {
                outputs.insert(key.to_string(), value.to_string());
            }
        }
        outputs
    }
}

#[async_trait]
impl ProvisioningEngine for CloudFormationEngine {
    async fn deploy_stack(
        &self,
        stack: &StackArtifact,
        parameters: &IndexMap<String, String>,
    ) -> Result<StackOutputs> {
        let client = self.client_for(stack);
        let name = stack.name.as_str();
        let body = stack.template.to_json()?;

        let cfn_parameters = stack_parameters(parameters);
        let tags = stack_tags(&stack.tags);

        let status = Self::describe(&client, name)
            .await?
            .and_then(|s| s.stack_status().cloned());

        // A stack whose creation rolled back cannot be updated, only replaced
        if status == Some(StackStatus::RollbackComplete) {
            warn!("Stack {} is in ROLLBACK_COMPLETE, deleting it first", name);
            client
                .delete_stack()
                .stack_name(name)
                .send()
                .await
                .map_err(|e| Error::stack_deploy(name, describe_error(&e)))?;
            self.wait_until_settled(&client, name).await?;
        }

        let exists = matches!(
            status,
            Some(ref s) if *s != StackStatus::DeleteComplete && *s != StackStatus::RollbackComplete
        );

        if exists {
            info!("Updating stack {} in {}", name, stack.region_display());
            let result = client
                .update_stack()
                .stack_name(name)
                .template_body(&body)
                .set_parameters(Some(cfn_parameters))
                .set_tags(Some(tags))
                .capabilities(Capability::CapabilityIam)
                .send()
                .await;

            if let Err(e) = result {
                let message = describe_error(&e);
                if !message.contains(NO_UPDATES) {
                    return Err(Error::stack_deploy(name, message));
                }
                info!("Stack {} is up to date", name);
            }
        } else {
            info!("Creating stack {} in {}", name, stack.region_display());
            client
                .create_stack()
                .stack_name(name)
                .template_body(&body)
                .set_parameters(Some(cfn_parameters))
                .set_tags(Some(tags))
                .capabilities(Capability::CapabilityIam)
                .on_failure(OnFailure::Delete)
                .send()
                .await
                .map_err(|e| Error::stack_deploy(name, describe_error(&e)))?;
        }

        match self.wait_until_settled(&client, name).await? {
            StackState::Complete => {}
            StackState::Failed(reason) => return Err(Error::stack_deploy(name, reason)),
            StackState::Deleted => {
                return Err(Error::stack_deploy(name, "stack was rolled back and deleted"))
            }
            StackState::InProgress => {
                return Err(Error::stack_deploy(name, "stack did not settle"))
            }
        }

        let settled = Self::describe(&client, name)
            .await?
            .ok_or_else(|| Error::stack_deploy(name, "stack vanished after deploy"))?;
        let outputs = Self::read_outputs(&settled);
        info!("Stack {} deployed with {} outputs", name, outputs.len());
        Ok(outputs)
    }

    async fn destroy_stack(&self, stack: &StackArtifact) -> Result<()> {
        let client = self.client_for(stack);
        let name = stack.name.as_str();

        if Self::describe(&client, name).await?.is_none() {
            warn!("Stack {} does not exist, nothing to destroy", name);
            return Ok(());
        }

        info!("Deleting stack {} in {}", name, stack.region_display());
        client
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| Error::stack_destroy(name, describe_error(&e)))?;

        match self.wait_until_settled(&client, name).await {
            Ok(StackState::Deleted) => Ok(()),
            Ok(StackState::Failed(reason)) => Err(Error::stack_destroy(name, reason)),
            Ok(other) => Err(Error::stack_destroy(
                name,
                format!("unexpected state after delete: {:?}", other),
            )),
            Err(e) => Err(Error::stack_destroy(name, e.to_string())),
        }
    }

    async fn current_template(&self, stack: &StackArtifact) -> Result<Option<serde_json::Value>> {
        let client = self.client_for(stack);
        let name = stack.name.as_str();

        if Self::describe(&client, name).await?.is_none() {
            return Ok(None);
        }

        let resp = client
            .get_template()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| Error::stack_deploy(name, describe_error(&e)))?;

        match resp.template_body() {
            Some(body) => Ok(Some(
                serde_json::from_str::<serde_json::Value>(body)
                    .or_else(|_| serde_yaml::from_str::<serde_json::Value>(body))?,
            )),
            None => Ok(None),
        }
    }
}

fn stack_parameters(parameters: &IndexMap<String, String>) -> Vec<Parameter> {
    parameters
        .iter()
        .map(|(k, v)| Parameter::builder().parameter_key(k).parameter_value(v).build())
        .collect()
}

fn stack_tags(tags: &IndexMap<String, String>) -> Vec<Tag> {
    tags.iter()
        .map(|(k, v)| Tag::builder().key(k).value(v).build())
        .collect()
}
