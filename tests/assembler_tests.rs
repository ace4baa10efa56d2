//! Integration tests for site assembly and synthesis
//!
//! Tests cover:
//! - The reference site scenario end to end
//! - Pre-condition failures aborting before anything is declared
//! - Repeatable assembly
//! - Stack split, ordering and cross-stack parameters
//! - The context cache keeping synthesis offline

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use sitestack::assembler::{assemble, outputs, CERTIFICATE_ARN_PARAMETER};
use sitestack::error::Error;
use sitestack::graph::{DependencyKind, PUBLISH_SCOPE};
use sitestack::provider::{ContextLookup, ZoneLookup};
use sitestack::resources::{RemovalPolicy, CERTIFICATE_REGION};
use std::sync::Arc;

// ============================================================================
// Reference scenario
// ============================================================================

#[tokio::test]
async fn test_reference_site_declarations() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let zones = FakeZoneLookup::with_zone(example_zone());

    let site = assemble(&config, &zones).await.unwrap();

    assert_eq!(site.domain().name(), SITE_DOMAIN);
    assert_eq!(site.bucket().bucket_name(), SITE_DOMAIN);
    assert_eq!(site.certificate().domain_name(), SITE_DOMAIN);
    assert_eq!(site.certificate().region(), "us-east-1");
    assert_eq!(site.distribution().aliases(), [SITE_DOMAIN.to_string()]);
    assert_eq!(site.alias_record().record_name(), SITE_DOMAIN);
    assert_eq!(site.zone().hosted_zone_id, ZONE_ID);
    assert_eq!(site.bucket().removal_policy(), RemovalPolicy::Destroy);
    assert_eq!(site.deployment().invalidation_paths(), ["/*".to_string()]);
    assert_eq!(site.deployment().destination_bucket(), SITE_DOMAIN);
    assert!(site.deployment().prune());

    assert_eq!(
        site.outputs()[outputs::SITE].value,
        json!("https://nextjs-10-static-example.dennisokeeffe.com")
    );
    let output_names: Vec<&str> = site.outputs().keys().map(String::as_str).collect();
    assert_eq!(output_names, vec!["Site", "Bucket", "Certificate", "DistributionId"]);

    assert_eq!(zones.calls(), 1);
    site.verify().unwrap();
}

#[tokio::test]
async fn test_reference_site_templates() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let zones = FakeZoneLookup::with_zone(example_zone());

    let assembly = assemble(&config, &zones).await.unwrap().synthesize().unwrap();

    let names: Vec<&str> = assembly.stacks().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["NextjsStaticSite-certificate", "NextjsStaticSite"]);

    let cert_stack = &assembly.stacks()[0];
    assert_eq!(cert_stack.environment.region.as_deref(), Some(CERTIFICATE_REGION));
    assert_eq!(cert_stack.environment.account.as_deref(), Some(ACCOUNT));
    let cert = cert_stack.template.resource("SiteCertificate").unwrap();
    assert_eq!(cert["Type"], "AWS::CertificateManager::Certificate");
    assert_eq!(cert["Properties"]["ValidationMethod"], "DNS");
    assert_eq!(
        cert["Properties"]["DomainValidationOptions"][0]["HostedZoneId"],
        ZONE_ID
    );
    assert!(cert_stack.template.outputs().contains_key(outputs::CERTIFICATE_ARN));

    let site_stack = &assembly.stacks()[1];
    assert_eq!(site_stack.environment.region.as_deref(), Some(REGION));
    assert_eq!(site_stack.dependencies, vec!["NextjsStaticSite-certificate"]);
    assert_eq!(site_stack.parameters.len(), 1);
    assert_eq!(site_stack.parameters[0].parameter, CERTIFICATE_ARN_PARAMETER);
    assert_eq!(
        site_stack.parameters[0].source.to_string(),
        "NextjsStaticSite-certificate.CertificateArn"
    );

    let resources: Vec<&str> = site_stack
        .template
        .resources()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        resources,
        vec!["SiteBucket", "SiteBucketPolicy", "SiteDistribution", "SiteAliasRecord"]
    );

    let bucket = site_stack.template.resource("SiteBucket").unwrap();
    assert_eq!(bucket["Properties"]["BucketName"], SITE_DOMAIN);
    assert_eq!(bucket["DeletionPolicy"], "Delete");
    assert_eq!(
        bucket["Properties"]["WebsiteConfiguration"],
        json!({"IndexDocument": "index.html", "ErrorDocument": "error.html"})
    );

    let distribution = &site_stack.template.resource("SiteDistribution").unwrap()["Properties"]
        ["DistributionConfig"];
    assert_eq!(distribution["Aliases"], json!([SITE_DOMAIN]));
    assert_eq!(
        distribution["ViewerCertificate"],
        json!({
            "AcmCertificateArn": {"Ref": "CertificateArn"},
            "MinimumProtocolVersion": "TLSv1.1_2016",
            "SslSupportMethod": "sni-only"
        })
    );
    assert_eq!(
        distribution["Origins"][0]["CustomOriginConfig"]["OriginProtocolPolicy"],
        "http-only"
    );

    let record = &site_stack.template.resource("SiteAliasRecord").unwrap()["Properties"];
    assert_eq!(record["Type"], "A");
    assert_eq!(record["Name"], format!("{}.", SITE_DOMAIN));
    assert_eq!(record["HostedZoneId"], ZONE_ID);
    assert_eq!(
        record["AliasTarget"]["DNSName"],
        json!({"Fn::GetAtt": ["SiteDistribution", "DomainName"]})
    );

    assert!(site_stack.template.resources_of_type("AWS::CertificateManager::Certificate").is_empty());
}

// ============================================================================
// Pre-conditions
// ============================================================================

#[tokio::test]
async fn test_missing_zone_aborts() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let zones = FakeZoneLookup::empty();

    let err = assemble(&config, &zones).await.unwrap_err();
    assert!(matches!(err, Error::ZoneNotFound { ref domain } if domain == ROOT_DOMAIN));
    assert!(err.is_precondition());
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_zone_for_other_domain_does_not_match() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let zones = FakeZoneLookup::with_zone(sitestack::resources::HostedZone::new(
        "Z999",
        "dennisokeeffe.org.",
    ));

    let err = assemble(&config, &zones).await.unwrap_err();
    assert!(matches!(err, Error::ZoneNotFound { .. }));
}

#[tokio::test]
async fn test_empty_subdomain_rejected_before_lookup() {
    let assets = asset_dir();
    let mut config = site_config(assets.path());
    config.sub_domain = "  ".to_string();
    let zones = FakeZoneLookup::with_zone(example_zone());

    let err = assemble(&config, &zones).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { ref key, .. } if key == "sub_domain"));
    assert_eq!(zones.calls(), 0);
}

#[tokio::test]
async fn test_missing_asset_directory() {
    let assets = asset_dir();
    let mut config = site_config(assets.path());
    config.asset_dir = assets.path().join("does-not-exist");
    let zones = FakeZoneLookup::with_zone(example_zone());

    let err = assemble(&config, &zones).await.unwrap_err();
    assert!(matches!(err, Error::AssetDirectoryNotFound(_)));
}

// ============================================================================
// Repeatability
// ============================================================================

#[tokio::test]
async fn test_assembly_is_repeatable() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let zones = FakeZoneLookup::with_zone(example_zone());

    let first = assemble(&config, &zones).await.unwrap();
    let second = assemble(&config, &zones).await.unwrap();
    assert_eq!(first, second);

    let a = first.synthesize().unwrap();
    let b = second.synthesize().unwrap();
    assert_eq!(a, b);
    for (x, y) in a.stacks().iter().zip(b.stacks()) {
        assert_eq!(x.template.to_json().unwrap(), y.template.to_json().unwrap());
    }
    assert_eq!(a.manifest(), b.manifest());
}

#[tokio::test]
async fn test_write_to_emits_templates_and_manifest() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let zones = FakeZoneLookup::with_zone(example_zone());
    let assembly = assemble(&config, &zones).await.unwrap().synthesize().unwrap();

    let out = tempfile::tempdir().unwrap();
    let written = assembly.write_to(&out.path().join("site.out")).unwrap();
    assert_eq!(written.len(), 3);

    let manifest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("site.out/manifest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["version"], "1.0");
    assert_eq!(
        manifest["stacks"]["NextjsStaticSite"]["parameters"]["CertificateArn"],
        json!({"stack": "NextjsStaticSite-certificate", "output": "CertificateArn"})
    );
    assert_eq!(
        manifest["stacks"]["NextjsStaticSite-certificate"]["environment"]["region"],
        "us-east-1"
    );

    let template: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("site.out/NextjsStaticSite.template.json"))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(template["Parameters"]["CertificateArn"]["Type"], "String");
}

// ============================================================================
// Graph
// ============================================================================

#[tokio::test]
async fn test_graph_edges_and_order() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let zones = FakeZoneLookup::with_zone(example_zone());
    let site = assemble(&config, &zones).await.unwrap();
    let graph = site.graph();

    assert!(!graph.has_cycles());
    assert_eq!(graph.node_count(), 7);

    let order = graph.topological_order().unwrap();
    let pos = |id: &str| order.iter().position(|n| n == id).unwrap();
    assert!(pos("Zone") < pos("SiteCertificate"));
    assert!(pos("SiteCertificate") < pos("SiteDistribution"));
    assert!(pos("SiteBucket") < pos("SiteDistribution"));
    assert!(pos("SiteDistribution") < pos("SiteAliasRecord"));
    assert!(pos("SiteBucket") < pos("DeployWithInvalidation"));
    assert!(pos("SiteDistribution") < pos("DeployWithInvalidation"));
    assert_eq!(graph.dependents("DeployWithInvalidation"), Vec::<String>::new());

    assert!(graph
        .edges()
        .contains(&("SiteCertificate".into(), "SiteDistribution".into(), DependencyKind::CrossStack)));
    assert_eq!(graph.nodes_in_scope(PUBLISH_SCOPE), vec!["DeployWithInvalidation"]);
    assert!(graph.to_dot().contains("\"SiteCertificate\" -> \"SiteDistribution\" [style=dashed];"));
}

// ============================================================================
// Context cache
// ============================================================================

#[tokio::test]
async fn test_context_cache_serves_second_run_offline() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let dir = tempfile::tempdir().unwrap();
    let context_path = dir.path().join("sitestack.context.json");

    let fake = Arc::new(FakeZoneLookup::with_zone(example_zone()));
    let inner: Arc<dyn ZoneLookup> = fake.clone();
    let online = ContextLookup::open(&context_path, Some(inner)).unwrap();
    let first = assemble(&config, &online).await.unwrap();
    assert_eq!(fake.calls(), 1);
    assert!(context_path.exists());

    let offline = ContextLookup::open(&context_path, None).unwrap();
    let second = assemble(&config, &offline).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_lookups_disabled_without_cache() {
    let assets = asset_dir();
    let config = site_config(assets.path());
    let dir = tempfile::tempdir().unwrap();

    let offline = ContextLookup::open(dir.path().join("empty.json"), None).unwrap();
    let err = assemble(&config, &offline).await.unwrap_err();
    match err {
        Error::LookupsDisabled { key } => {
            assert_eq!(
                key,
                "hosted-zone:account=123456789012:domainName=dennisokeeffe.com:region=us-west-2"
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
