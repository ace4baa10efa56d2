//! Shared test utilities and fixtures for the Sitestack test suite.
//!
//! This module provides:
//! - In-memory fakes for the zone lookup, provisioning engine and content publisher
//! - Fixtures for asset directories and seeded context files
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tempfile::TempDir;

use sitestack::assembler::outputs;
use sitestack::assembly::StackArtifact;
use sitestack::config::SiteConfig;
use sitestack::error::{Error, Result};
use sitestack::provider::{ContentPublisher, ProvisioningEngine, StackOutputs, UploadSummary, ZoneLookup};
use sitestack::resources::{BucketDeployment, HostedZone, ZoneQuery};

pub const ROOT_DOMAIN: &str = "dennisokeeffe.com";
pub const SUB_DOMAIN: &str = "nextjs-10-static-example";
pub const SITE_DOMAIN: &str = "nextjs-10-static-example.dennisokeeffe.com";
pub const ZONE_ID: &str = "Z0123456789ABCDEFGHIJ";
pub const ACCOUNT: &str = "123456789012";
pub const REGION: &str = "us-west-2";

// ============================================================================
// Fixtures
// ============================================================================

/// A temporary asset directory holding a minimal built site
pub fn asset_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "index.html", "<h1>Hello</h1>");
    write_file(dir.path(), "404.html", "<h1>Not found</h1>");
    write_file(dir.path(), "_next/static/chunks/main.js", "console.log('hi')");
    dir
}

/// Write `content` to `rel` under `dir`, creating parents
pub fn write_file(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// The example site configuration, pointed at `assets`
pub fn site_config(assets: &Path) -> SiteConfig {
    let mut config = SiteConfig::new(ROOT_DOMAIN, SUB_DOMAIN);
    config.stack_name = "NextjsStaticSite".to_string();
    config.asset_dir = assets.to_path_buf();
    config.env.account = Some(ACCOUNT.to_string());
    config.env.region = Some(REGION.to_string());
    config
}

/// The hosted zone for the example root domain
pub fn example_zone() -> HostedZone {
    HostedZone::new(&format!("/hostedzone/{}", ZONE_ID), &format!("{}.", ROOT_DOMAIN))
}

/// Write a context file caching the example zone for `account`/`region`
pub fn seed_context(path: &Path, account: Option<&str>, region: Option<&str>) {
    let key = ZoneQuery::new(ROOT_DOMAIN)
        .with_env(account.map(str::to_string), region.map(str::to_string))
        .context_key();
    let mut content = serde_json::Map::new();
    content.insert(key, serde_json::to_value(example_zone()).unwrap());
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

// ============================================================================
// Fake zone lookup
// ============================================================================

/// Serves a fixed set of zones and counts calls
#[derive(Default)]
pub struct FakeZoneLookup {
    zones: Vec<HostedZone>,
    calls: AtomicUsize,
}

impl FakeZoneLookup {
    pub fn with_zone(zone: HostedZone) -> Self {
        Self {
            zones: vec![zone],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ZoneLookup for FakeZoneLookup {
    async fn find_zone(&self, query: &ZoneQuery) -> Result<Option<HostedZone>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .zones
            .iter()
            .find(|z| query.matches_name(&z.zone_name))
            .cloned())
    }
}

// ============================================================================
// Recording provisioning engine
// ============================================================================

/// A deploy call as seen by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct DeployCall {
    pub stack: String,
    pub region: Option<String>,
    pub parameters: IndexMap<String, String>,
}

/// Records every call and answers with canned outputs
#[derive(Default)]
pub struct RecordingEngine {
    pub deployed: Mutex<Vec<DeployCall>>,
    pub destroyed: Mutex<Vec<String>>,
    /// Outputs to return per stack; stacks not listed get derived outputs
    pub outputs: Mutex<IndexMap<String, StackOutputs>>,
    /// Deployed templates per stack, for diff
    pub templates: Mutex<IndexMap<String, serde_json::Value>>,
    /// Stack whose deploy fails
    pub fail_on: Mutex<Option<String>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deployed_stacks(&self) -> Vec<String> {
        self.deployed.lock().iter().map(|c| c.stack.clone()).collect()
    }

    fn derived_outputs(stack: &StackArtifact) -> StackOutputs {
        let mut out = StackOutputs::new();
        for name in stack.template.outputs().keys() {
            let value = match name.as_str() {
                outputs::CERTIFICATE_ARN => format!(
                    "arn:aws:acm:us-east-1:{}:certificate/0000-1111",
                    ACCOUNT
                ),
                outputs::DISTRIBUTION_ID => "E2EXAMPLE123".to_string(),
                outputs::SITE => format!("https://{}", SITE_DOMAIN),
                outputs::BUCKET => SITE_DOMAIN.to_string(),
                outputs::CERTIFICATE => format!(
                    "arn:aws:acm:us-east-1:{}:certificate/0000-1111",
                    ACCOUNT
                ),
                other => format!("value-of-{}", other),
            };
            out.insert(name.clone(), value);
        }
        out
    }
}

#[async_trait]
impl ProvisioningEngine for RecordingEngine {
    async fn deploy_stack(
        &self,
        stack: &StackArtifact,
        parameters: &IndexMap<String, String>,
    ) -> Result<StackOutputs> {
        self.deployed.lock().push(DeployCall {
            stack: stack.name.clone(),
            region: stack.environment.region.clone(),
            parameters: parameters.clone(),
        });

        if self.fail_on.lock().as_deref() == Some(stack.name.as_str()) {
            return Err(Error::stack_deploy(&stack.name, "ROLLBACK_COMPLETE: simulated"));
        }

        self.templates
            .lock()
            .insert(stack.name.clone(), stack.template.to_value()?);

        Ok(self
            .outputs
            .lock()
            .get(&stack.name)
            .cloned()
            .unwrap_or_else(|| Self::derived_outputs(stack)))
    }

    async fn destroy_stack(&self, stack: &StackArtifact) -> Result<()> {
        self.destroyed.lock().push(stack.name.clone());
        self.templates.lock().shift_remove(&stack.name);
        Ok(())
    }

    async fn current_template(&self, stack: &StackArtifact) -> Result<Option<serde_json::Value>> {
        Ok(self.templates.lock().get(&stack.name).cloned())
    }
}

// ============================================================================
// Recording content publisher
// ============================================================================

/// Records uploads and invalidations
#[derive(Default)]
pub struct RecordingPublisher {
    pub uploads: Mutex<Vec<(PathBuf, String)>>,
    pub invalidations: Mutex<Vec<(String, Vec<String>)>>,
    pub emptied: Mutex<Vec<String>>,
    /// Objects reported as removed by `empty_bucket`
    pub objects_in_bucket: AtomicUsize,
    pub fail_empty: Mutex<bool>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ContentPublisher for RecordingPublisher {
    async fn upload(&self, deployment: &BucketDeployment, bucket: &str) -> Result<UploadSummary> {
        let assets = sitestack::provider::assets::collect_assets(deployment.source())?;
        self.uploads
            .lock()
            .push((deployment.source().to_path_buf(), bucket.to_string()));
        Ok(UploadSummary {
            uploaded: assets.len(),
            skipped: 0,
            deleted: 0,
            bytes: assets.iter().map(|a| a.size).sum(),
        })
    }

    async fn empty_bucket(&self, bucket: &str) -> Result<usize> {
        if *self.fail_empty.lock() {
            return Err(Error::publish(bucket, "AccessDenied: simulated"));
        }
        self.emptied.lock().push(bucket.to_string());
        Ok(self.objects_in_bucket.swap(0, Ordering::SeqCst))
    }

    async fn invalidate(&self, distribution_id: &str, paths: &[String]) -> Result<String> {
        self.invalidations
            .lock()
            .push((distribution_id.to_string(), paths.to_vec()));
        Ok("I2J0I21PCUYOIK".to_string())
    }
}
