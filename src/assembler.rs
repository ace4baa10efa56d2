//! Site assembler.
//!
//! Turns a [`SiteConfig`] into the full set of declarations for a static site:
//!
//! 1. hosted zone lookup
//! 2. site domain derivation
//! 3. content bucket and its public-read policy
//! 4. DNS-validated certificate, pinned to `us-east-1`
//! 5. CloudFront distribution
//! 6. Route 53 alias record
//! 7. content deployment with cache invalidation
//!
//! Each step consumes what the previous ones declared and records the wiring
//! in a [`ResourceGraph`]. Nothing talks to AWS except the zone lookup, and a
//! failed lookup aborts before any resource is declared.
//!
//! [`SiteStack::synthesize`] splits the declarations into two stacks: the
//! certificate stack in `us-east-1` and the site stack in the deployment
//! region, joined by the `CertificateArn` output/parameter pair.

use crate::assembly::{CloudAssembly, OutputRef, ParameterBinding, StackArtifact, StackEnvironment};
use crate::config::SiteConfig;
use crate::domain::SiteDomain;
use crate::error::{Error, Result};
use crate::graph::{
    DependencyKind, ResourceGraph, ResourceKind, ResourceNode, EXTERNAL_SCOPE, PUBLISH_SCOPE,
};
use crate::provider::ZoneLookup;
use crate::resources::intrinsic::reference;
use crate::resources::{
    AliasRecord, BucketDeployment, BucketPolicy, CfnResource, DnsValidatedCertificate, HostedZone,
    RemovalPolicy, SiteBucket, SiteDistribution, ZoneQuery, CERTIFICATE_REGION,
    INVALIDATION_PATHS,
};
use crate::template::{Output, Parameter, Template};
use indexmap::IndexMap;
use serde_json::json;
use tracing::{debug, info};

/// Logical id of the looked-up hosted zone
pub const ZONE_ID: &str = "Zone";
/// Logical id of the content bucket
pub const SITE_BUCKET_ID: &str = "SiteBucket";
/// Logical id of the bucket policy
pub const SITE_BUCKET_POLICY_ID: &str = "SiteBucketPolicy";
/// Logical id of the certificate
pub const SITE_CERTIFICATE_ID: &str = "SiteCertificate";
/// Logical id of the distribution
pub const SITE_DISTRIBUTION_ID: &str = "SiteDistribution";
/// Logical id of the alias record
pub const SITE_ALIAS_RECORD_ID: &str = "SiteAliasRecord";
/// Id of the content deployment
pub const DEPLOYMENT_ID: &str = "DeployWithInvalidation";

/// Parameter of the site stack carrying the certificate ARN
pub const CERTIFICATE_ARN_PARAMETER: &str = "CertificateArn";

/// Output keys
pub mod outputs {
    /// `https://<site domain>`
    pub const SITE: &str = "Site";
    /// Bucket name
    pub const BUCKET: &str = "Bucket";
    /// Certificate ARN
    pub const CERTIFICATE: &str = "Certificate";
    /// Distribution id
    pub const DISTRIBUTION_ID: &str = "DistributionId";
    /// Certificate ARN exported by the certificate stack
    pub const CERTIFICATE_ARN: &str = "CertificateArn";
}

/// Everything the assembler declared for one site
#[derive(Debug, Clone, PartialEq)]
pub struct SiteStack {
    stack_name: String,
    certificate_stack_name: String,
    environment: StackEnvironment,
    tags: IndexMap<String, String>,
    zone: HostedZone,
    domain: SiteDomain,
    bucket: SiteBucket,
    bucket_policy: BucketPolicy,
    certificate: DnsValidatedCertificate,
    distribution: SiteDistribution,
    alias_record: AliasRecord,
    deployment: BucketDeployment,
    outputs: IndexMap<String, Output>,
    graph: ResourceGraph,
}

/// Run the declaration pipeline for `config`
pub async fn assemble(config: &SiteConfig, zones: &dyn ZoneLookup) -> Result<SiteStack> {
    config.validate()?;

    let stack_name = config.stack_name.clone();
    let certificate_stack_name = config.certificate_stack_name();
    let environment = StackEnvironment {
        account: config.env.account.clone(),
        region: config.env.region.clone(),
    };
    let mut graph = ResourceGraph::new();
    let mut site_outputs = IndexMap::new();

    // 1. Hosted zone
    let query = ZoneQuery::new(&config.root_domain)
        .with_env(environment.account.clone(), environment.region.clone());
    debug!("Looking up hosted zone for {}", query.domain_name);
    let zone = zones
        .find_zone(&query)
        .await?
        .ok_or_else(|| Error::ZoneNotFound {
            domain: config.root_domain.clone(),
        })?;
    info!(
        "Resolved hosted zone {} ({})",
        zone.zone_name, zone.hosted_zone_id
    );
    graph.add_node(ResourceNode::new(
        ZONE_ID,
        ResourceKind::HostedZone,
        EXTERNAL_SCOPE,
    ));

    // 2. Site domain
    let domain = SiteDomain::derive(&config.root_domain, &config.sub_domain)?;
    site_outputs.insert(
        outputs::SITE.to_string(),
        Output::new(json!(domain.url())).with_description("Public URL of the site"),
    );

    // 3. Bucket
    let bucket = SiteBucket::new(SITE_BUCKET_ID, &domain);
    let bucket_policy = BucketPolicy::public_read(SITE_BUCKET_POLICY_ID, &bucket);
    info!("Declared bucket {}", bucket.bucket_name());
    graph.add_node(ResourceNode::new(
        SITE_BUCKET_ID,
        ResourceKind::Bucket,
        &stack_name,
    ));
    graph.add_node(ResourceNode::new(
        SITE_BUCKET_POLICY_ID,
        ResourceKind::BucketPolicy,
        &stack_name,
    ));
    graph.add_dependency(SITE_BUCKET_ID, SITE_BUCKET_POLICY_ID, DependencyKind::Reference)?;
    site_outputs.insert(
        outputs::BUCKET.to_string(),
        Output::new(bucket.name_ref()).with_description("Content bucket"),
    );

    // 4. Certificate
    let certificate = DnsValidatedCertificate::new(SITE_CERTIFICATE_ID, &domain, &zone);
    info!(
        "Declared certificate for {} in {}",
        certificate.domain_name(),
        certificate.region()
    );
    graph.add_node(ResourceNode::new(
        SITE_CERTIFICATE_ID,
        ResourceKind::Certificate,
        &certificate_stack_name,
    ));
    graph.add_dependency(ZONE_ID, SITE_CERTIFICATE_ID, DependencyKind::Lookup)?;
    site_outputs.insert(
        outputs::CERTIFICATE.to_string(),
        Output::new(reference(CERTIFICATE_ARN_PARAMETER)).with_description("Certificate ARN"),
    );

    // 5. Distribution
    let distribution = SiteDistribution::new(
        SITE_DISTRIBUTION_ID,
        &domain,
        reference(CERTIFICATE_ARN_PARAMETER),
        bucket.website_domain(),
    );
    info!("Declared distribution for {}", domain);
    graph.add_node(ResourceNode::new(
        SITE_DISTRIBUTION_ID,
        ResourceKind::Distribution,
        &stack_name,
    ));
    graph.add_dependency(
        SITE_CERTIFICATE_ID,
        SITE_DISTRIBUTION_ID,
        DependencyKind::CrossStack,
    )?;
    graph.add_dependency(SITE_BUCKET_ID, SITE_DISTRIBUTION_ID, DependencyKind::Attribute)?;
    site_outputs.insert(
        outputs::DISTRIBUTION_ID.to_string(),
        Output::new(distribution.id_ref()).with_description("CloudFront distribution id"),
    );

    // 6. Alias record
    let alias_record = AliasRecord::cloudfront_target(
        SITE_ALIAS_RECORD_ID,
        &zone,
        &domain,
        distribution.domain_name(),
    );
    info!("Declared alias record {}", alias_record.record_name());
    graph.add_node(ResourceNode::new(
        SITE_ALIAS_RECORD_ID,
        ResourceKind::AliasRecord,
        &stack_name,
    ));
    graph.add_dependency(ZONE_ID, SITE_ALIAS_RECORD_ID, DependencyKind::Lookup)?;
    graph.add_dependency(
        SITE_DISTRIBUTION_ID,
        SITE_ALIAS_RECORD_ID,
        DependencyKind::Attribute,
    )?;

    // 7. Content deployment
    let deployment = BucketDeployment::new(
        DEPLOYMENT_ID,
        &config.asset_dir,
        bucket.bucket_name(),
        OutputRef::new(&stack_name, outputs::DISTRIBUTION_ID),
    )?;
    info!(
        "Declared deployment of {} to {}",
        config.asset_dir.display(),
        bucket.bucket_name()
    );
    graph.add_node(ResourceNode::new(
        DEPLOYMENT_ID,
        ResourceKind::Deployment,
        PUBLISH_SCOPE,
    ));
    graph.add_dependency(SITE_BUCKET_ID, DEPLOYMENT_ID, DependencyKind::PostDeploy)?;
    graph.add_dependency(SITE_DISTRIBUTION_ID, DEPLOYMENT_ID, DependencyKind::PostDeploy)?;

    Ok(SiteStack {
        stack_name,
        certificate_stack_name,
        environment,
        tags: config.tags.clone(),
        zone,
        domain,
        bucket,
        bucket_policy,
        certificate,
        distribution,
        alias_record,
        deployment,
        outputs: site_outputs,
        graph,
    })
}

fn check(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::AssemblyInvariant(message()))
    }
}

impl SiteStack {
    /// Re-check every cross-resource invariant of the assembled site
    pub fn verify(&self) -> Result<()> {
        let name = self.domain.name();

        check(
            name == format!("{}.{}", self.domain.sub(), self.domain.root()),
            || format!("site domain '{}' is not sub + \".\" + root", name),
        )?;
        check(self.bucket.bucket_name() == name, || {
            format!(
                "bucket name '{}' differs from site domain '{}'",
                self.bucket.bucket_name(),
                name
            )
        })?;
        check(self.certificate.domain_name() == name, || {
            format!(
                "certificate domain '{}' differs from site domain '{}'",
                self.certificate.domain_name(),
                name
            )
        })?;
        check(self.distribution.aliases() == [name.to_string()], || {
            format!(
                "distribution aliases {:?} must be exactly ['{}']",
                self.distribution.aliases(),
                name
            )
        })?;
        check(self.alias_record.record_name() == name, || {
            format!(
                "alias record '{}' differs from site domain '{}'",
                self.alias_record.record_name(),
                name
            )
        })?;
        check(
            self.certificate.hosted_zone_id() == self.zone.hosted_zone_id
                && self.alias_record.hosted_zone_id() == self.zone.hosted_zone_id,
            || "certificate and alias record must use the resolved zone".to_string(),
        )?;
        check(self.certificate.region() == CERTIFICATE_REGION, || {
            format!("certificate must be issued in {}", CERTIFICATE_REGION)
        })?;
        check(
            self.bucket.removal_policy() == RemovalPolicy::Destroy,
            || "bucket removal policy must be destroy".to_string(),
        )?;
        check(
            self.deployment.invalidation_paths() == INVALIDATION_PATHS,
            || {
                format!(
                    "invalidation paths {:?} must be exactly {:?}",
                    self.deployment.invalidation_paths(),
                    INVALIDATION_PATHS
                )
            },
        )?;
        check(
            self.deployment.destination_bucket() == self.bucket.bucket_name(),
            || "deployment must target the site bucket".to_string(),
        )?;

        let settings = self.distribution.settings();
        check(
            settings.ssl_support_method == "sni-only"
                && settings.minimum_protocol_version == "TLSv1.1_2016"
                && settings.origin_protocol_policy == "http-only",
            || "distribution TLS or origin settings changed".to_string(),
        )?;

        if self.graph.has_cycles() {
            return Err(Error::DependencyCycle(format!(
                "{:?}",
                self.graph.cycles()
            )));
        }

        debug!("All invariants hold for {}", name);
        Ok(())
    }

    /// Render the certificate and site stacks into a cloud assembly
    pub fn synthesize(&self) -> Result<CloudAssembly> {
        self.verify()?;

        let mut certificate_template =
            Template::new(format!("TLS certificate for {}", self.domain));
        certificate_template.add_resource(&self.certificate)?;
        certificate_template.add_output(
            outputs::CERTIFICATE_ARN,
            Output::new(reference(self.certificate.logical_id()))
                .with_description("ARN of the validated certificate"),
        )?;

        let mut site_template = Template::new(format!("Static site {}", self.domain));
        site_template.add_parameter(
            CERTIFICATE_ARN_PARAMETER,
            Parameter::string(format!(
                "ACM certificate ARN from stack {}",
                self.certificate_stack_name
            )),
        )?;
        site_template.add_resource(&self.bucket)?;
        site_template.add_resource(&self.bucket_policy)?;
        site_template.add_resource(&self.distribution)?;
        site_template.add_resource(&self.alias_record)?;
        for (name, output) in &self.outputs {
            site_template.add_output(name.clone(), output.clone())?;
        }

        certificate_template.check_references()?;
        site_template.check_references()?;

        let scopes = self.stack_names();
        let mut artifacts: IndexMap<String, StackArtifact> = IndexMap::new();

        artifacts.insert(
            self.certificate_stack_name.clone(),
            StackArtifact {
                name: self.certificate_stack_name.clone(),
                environment: StackEnvironment {
                    account: self.environment.account.clone(),
                    region: Some(CERTIFICATE_REGION.to_string()),
                },
                template: certificate_template,
                parameters: Vec::new(),
                dependencies: self
                    .graph
                    .scope_dependencies(&self.certificate_stack_name, &scopes),
                tags: self.tags.clone(),
            },
        );
        artifacts.insert(
            self.stack_name.clone(),
            StackArtifact {
                name: self.stack_name.clone(),
                environment: self.environment.clone(),
                template: site_template,
                parameters: vec![ParameterBinding {
                    parameter: CERTIFICATE_ARN_PARAMETER.to_string(),
                    source: OutputRef::new(
                        &self.certificate_stack_name,
                        outputs::CERTIFICATE_ARN,
                    ),
                }],
                dependencies: self.graph.scope_dependencies(&self.stack_name, &scopes),
                tags: self.tags.clone(),
            },
        );

        let mut stacks = Vec::with_capacity(artifacts.len());
        for name in self.graph.scope_order(&scopes)? {
            if let Some(artifact) = artifacts.shift_remove(&name) {
                stacks.push(artifact);
            }
        }

        info!(
            "Synthesized {} stacks: {}",
            stacks.len(),
            stacks
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(CloudAssembly::new(stacks, self.deployment.clone()))
    }

    /// Names of the stacks this site synthesizes into
    pub fn stack_names(&self) -> Vec<String> {
        vec![
            self.stack_name.clone(),
            self.certificate_stack_name.clone(),
        ]
    }

    /// Site stack name
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Certificate stack name
    pub fn certificate_stack_name(&self) -> &str {
        &self.certificate_stack_name
    }

    /// Resolved hosted zone
    pub fn zone(&self) -> &HostedZone {
        &self.zone
    }

    /// Derived site domain
    pub fn domain(&self) -> &SiteDomain {
        &self.domain
    }

    /// Content bucket
    pub fn bucket(&self) -> &SiteBucket {
        &self.bucket
    }

    /// Public-read bucket policy
    pub fn bucket_policy(&self) -> &BucketPolicy {
        &self.bucket_policy
    }

    /// Certificate
    pub fn certificate(&self) -> &DnsValidatedCertificate {
        &self.certificate
    }

    /// Distribution
    pub fn distribution(&self) -> &SiteDistribution {
        &self.distribution
    }

    /// Alias record
    pub fn alias_record(&self) -> &AliasRecord {
        &self.alias_record
    }

    /// Content deployment
    pub fn deployment(&self) -> &BucketDeployment {
        &self.deployment
    }

    /// Site stack outputs, keyed `Site`, `Bucket`, `Certificate`, `DistributionId`
    pub fn outputs(&self) -> &IndexMap<String, Output> {
        &self.outputs
    }

    /// Dependency graph of the declarations
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }
}
