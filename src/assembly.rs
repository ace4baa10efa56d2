//! Cloud assembly: the synthesized stacks plus a manifest.
//!
//! Stacks are held in dependency order. Values that cross a stack boundary
//! travel as a [`ParameterBinding`]: the consuming stack declares a template
//! parameter and the provisioner fills it from the producing stack's outputs.

use crate::error::{ErrorContext, Result};
use crate::resources::BucketDeployment;
use crate::template::Template;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest schema version
pub const MANIFEST_VERSION: &str = "1.0";

/// Manifest file name inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Reference to a named output of a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    /// Producing stack
    pub stack: String,
    /// Output key
    pub output: String,
}

impl OutputRef {
    /// Create a new output reference
    pub fn new(stack: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            output: output.into(),
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stack, self.output)
    }
}

/// A template parameter filled from another stack's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBinding {
    /// Parameter name in the consuming template
    pub parameter: String,
    /// Where the value comes from
    pub source: OutputRef,
}

/// Account/region a stack deploys to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEnvironment {
    /// AWS account id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Region; `None` means the default region of the credential chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// One synthesized stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackArtifact {
    /// Stack name
    pub name: String,
    /// Where it deploys
    pub environment: StackEnvironment,
    /// The rendered template
    pub template: Template,
    /// Parameters filled from upstream outputs
    pub parameters: Vec<ParameterBinding>,
    /// Stacks that must be deployed first
    pub dependencies: Vec<String>,
    /// Stack-level tags, propagated to taggable resources
    pub tags: IndexMap<String, String>,
}

impl StackArtifact {
    /// File name of the template in the output directory
    pub fn template_file(&self) -> String {
        format!("{}.template.json", self.name)
    }

    /// Region or a placeholder for display
    pub fn region_display(&self) -> &str {
        self.environment.region.as_deref().unwrap_or("(default)")
    }
}

/// Synthesized stacks in dependency order, plus the content deployment
#[derive(Debug, Clone, PartialEq)]
pub struct CloudAssembly {
    stacks: Vec<StackArtifact>,
    deployment: BucketDeployment,
}

impl CloudAssembly {
    /// Assemble from stacks already in dependency order
    pub fn new(stacks: Vec<StackArtifact>, deployment: BucketDeployment) -> Self {
        Self { stacks, deployment }
    }

    /// Stacks in dependency order
    pub fn stacks(&self) -> &[StackArtifact] {
        &self.stacks
    }

    /// A stack by name
    pub fn stack(&self, name: &str) -> Option<&StackArtifact> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// The content deployment run after the stacks
    pub fn deployment(&self) -> &BucketDeployment {
        &self.deployment
    }

    /// The manifest describing every stack and the deployment
    pub fn manifest(&self) -> serde_json::Value {
        let stacks: serde_json::Map<String, serde_json::Value> = self
            .stacks
            .iter()
            .map(|stack| {
                let parameters: serde_json::Map<String, serde_json::Value> = stack
                    .parameters
                    .iter()
                    .map(|b| (b.parameter.clone(), json!(b.source)))
                    .collect();
                (
                    stack.name.clone(),
                    json!({
                        "environment": stack.environment,
                        "templateFile": stack.template_file(),
                        "dependencies": stack.dependencies,
                        "parameters": parameters,
                        "tags": stack.tags,
                    }),
                )
            })
            .collect();

        json!({
            "version": MANIFEST_VERSION,
            "stacks": stacks,
            "deployment": self.deployment,
        })
    }

    /// Write the manifest and every template into `dir`, returning the files written
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let mut written = Vec::with_capacity(self.stacks.len() + 1);

        for stack in &self.stacks {
            let path = dir.join(stack.template_file());
            std::fs::write(&path, stack.template.to_json()?)
                .with_context(|| format!("Failed to write template: {}", path.display()))?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        std::fs::write(&manifest_path, serde_json::to_string_pretty(&self.manifest())?)
            .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;
        debug!("Wrote {}", manifest_path.display());
        written.push(manifest_path);

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembly(asset_dir: &Path) -> CloudAssembly {
        let deployment = BucketDeployment::new(
            "DeployWithInvalidation",
            asset_dir,
            "www.example.com",
            OutputRef::new("Site", "DistributionId"),
        )
        .unwrap();

        let cert = StackArtifact {
            name: "Site-certificate".into(),
            environment: StackEnvironment {
                account: None,
                region: Some("us-east-1".into()),
            },
            template: Template::new("certificate"),
            parameters: vec![],
            dependencies: vec![],
            tags: IndexMap::new(),
        };
        let site = StackArtifact {
            name: "Site".into(),
            environment: StackEnvironment::default(),
            template: Template::new("site"),
            parameters: vec![ParameterBinding {
                parameter: "CertificateArn".into(),
                source: OutputRef::new("Site-certificate", "CertificateArn"),
            }],
            dependencies: vec!["Site-certificate".into()],
            tags: IndexMap::from([("Project".to_string(), "demo".to_string())]),
        };
        CloudAssembly::new(vec![cert, site], deployment)
    }

    #[test]
    fn test_manifest_shape() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = assembly(dir.path()).manifest();
        assert_eq!(manifest["version"], "1.0");
        assert_eq!(
            manifest["stacks"]["Site"]["templateFile"],
            "Site.template.json"
        );
        assert_eq!(
            manifest["stacks"]["Site"]["parameters"]["CertificateArn"]["stack"],
            "Site-certificate"
        );
        assert_eq!(
            manifest["stacks"]["Site-certificate"]["environment"]["region"],
            "us-east-1"
        );
        assert_eq!(manifest["deployment"]["invalidationPaths"][0], "/*");
    }

    #[test]
    fn test_write_to_creates_files() {
        let assets = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("site.out");

        let written = assembly(assets.path()).write_to(&target).unwrap();
        assert_eq!(written.len(), 3);
        assert!(target.join("manifest.json").is_file());
        assert!(target.join("Site.template.json").is_file());
        assert!(target.join("Site-certificate.template.json").is_file());
    }

    #[test]
    fn test_output_ref_display() {
        assert_eq!(
            OutputRef::new("Site", "DistributionId").to_string(),
            "Site.DistributionId"
        );
    }
}
