//! Integration tests for the provisioner
//!
//! Runs full deploy/destroy/diff flows against recording fakes of the
//! provisioning engine and content publisher.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sitestack::assembler::{assemble, outputs};
use sitestack::assembly::{CloudAssembly, OutputRef, ParameterBinding};
use sitestack::error::Error;
use sitestack::provider::StackOutputs;
use sitestack::provision::Provisioner;

async fn example_assembly(assets: &std::path::Path) -> CloudAssembly {
    let config = site_config(assets);
    let zones = FakeZoneLookup::with_zone(example_zone());
    assemble(&config, &zones)
        .await
        .unwrap()
        .synthesize()
        .unwrap()
}

#[tokio::test]
async fn test_deploy_resolves_certificate_parameter() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    let publisher = RecordingPublisher::new();
    let provisioner = Provisioner::new(engine.clone(), publisher.clone());

    let report = provisioner.deploy(&assembly, false).await.unwrap();

    let calls = engine.deployed.lock().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].stack, "NextjsStaticSite-certificate");
    assert_eq!(calls[0].region.as_deref(), Some("us-east-1"));
    assert!(calls[0].parameters.is_empty());

    assert_eq!(calls[1].stack, "NextjsStaticSite");
    assert_eq!(calls[1].region.as_deref(), Some(REGION));
    assert_eq!(
        calls[1].parameters.get("CertificateArn").map(String::as_str),
        Some("arn:aws:acm:us-east-1:123456789012:certificate/0000-1111")
    );

    let site = report.site_outputs().unwrap();
    assert_eq!(
        site.get(outputs::SITE).map(String::as_str),
        Some("https://nextjs-10-static-example.dennisokeeffe.com")
    );
    assert_eq!(site.get(outputs::BUCKET).map(String::as_str), Some(SITE_DOMAIN));
    assert!(site.contains_key(outputs::CERTIFICATE));
    assert!(site.contains_key(outputs::DISTRIBUTION_ID));
}

#[tokio::test]
async fn test_deploy_publishes_then_invalidates() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    let publisher = RecordingPublisher::new();
    let provisioner = Provisioner::new(engine.clone(), publisher.clone());

    let report = provisioner.deploy(&assembly, false).await.unwrap();

    let uploads = publisher.uploads.lock().clone();
    assert_eq!(uploads, vec![(assets.path().to_path_buf(), SITE_DOMAIN.to_string())]);

    let invalidations = publisher.invalidations.lock().clone();
    assert_eq!(
        invalidations,
        vec![("E2EXAMPLE123".to_string(), vec!["/*".to_string()])]
    );

    let upload = report.upload.unwrap();
    assert_eq!(upload.uploaded, 3);
    assert_eq!(report.invalidation_id.as_deref(), Some("I2J0I21PCUYOIK"));
}

#[tokio::test]
async fn test_skip_content() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    let publisher = RecordingPublisher::new();
    let provisioner = Provisioner::new(engine.clone(), publisher.clone());

    let report = provisioner.deploy(&assembly, true).await.unwrap();

    assert_eq!(engine.deployed_stacks().len(), 2);
    assert!(publisher.uploads.lock().is_empty());
    assert!(publisher.invalidations.lock().is_empty());
    assert!(report.upload.is_none());
    assert!(report.invalidation_id.is_none());
}

#[tokio::test]
async fn test_missing_upstream_output() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    engine.outputs.lock().insert(
        "NextjsStaticSite-certificate".to_string(),
        StackOutputs::new(),
    );
    let provisioner = Provisioner::new(engine.clone(), RecordingPublisher::new());

    let err = provisioner.deploy(&assembly, false).await.unwrap_err();
    assert!(matches!(
        err,
        Error::MissingOutput { ref stack, ref output }
            if stack == "NextjsStaticSite-certificate" && output == "CertificateArn"
    ));
    assert_eq!(err.exit_code(), 6);
    assert_eq!(engine.deployed_stacks(), vec!["NextjsStaticSite-certificate"]);
}

#[tokio::test]
async fn test_out_of_order_stacks_rejected() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let reversed: Vec<_> = assembly.stacks().iter().rev().cloned().collect();
    let reversed = CloudAssembly::new(reversed, assembly.deployment().clone());

    let engine = RecordingEngine::new();
    let provisioner = Provisioner::new(engine.clone(), RecordingPublisher::new());

    let err = provisioner.deploy(&reversed, true).await.unwrap_err();
    assert!(matches!(
        err,
        Error::DependencyOrder { ref stack, ref dependency }
            if stack == "NextjsStaticSite" && dependency == "NextjsStaticSite-certificate"
    ));
    assert!(engine.deployed_stacks().is_empty());
}

#[tokio::test]
async fn test_binding_to_unknown_stack_rejected() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let mut stacks = assembly.stacks().to_vec();
    stacks[1].parameters.push(ParameterBinding {
        parameter: "Extra".to_string(),
        source: OutputRef::new("Elsewhere", "Value"),
    });
    let assembly = CloudAssembly::new(stacks, assembly.deployment().clone());

    let provisioner = Provisioner::new(RecordingEngine::new(), RecordingPublisher::new());
    let err = provisioner.deploy(&assembly, true).await.unwrap_err();
    assert!(matches!(err, Error::DependencyOrder { ref dependency, .. } if dependency == "Elsewhere"));
}

#[tokio::test]
async fn test_stack_failure_stops_the_run() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    *engine.fail_on.lock() = Some("NextjsStaticSite".to_string());
    let publisher = RecordingPublisher::new();
    let provisioner = Provisioner::new(engine.clone(), publisher.clone());

    let err = provisioner.deploy(&assembly, false).await.unwrap_err();
    assert!(matches!(err, Error::StackDeploy { .. }));
    assert_eq!(err.exit_code(), 4);
    assert!(publisher.uploads.lock().is_empty());
}

#[tokio::test]
async fn test_destroy_reverses_order() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    let provisioner = Provisioner::new(engine.clone(), RecordingPublisher::new());

    let destroyed = provisioner.destroy(&assembly).await.unwrap();
    assert_eq!(destroyed, vec!["NextjsStaticSite", "NextjsStaticSite-certificate"]);
    assert_eq!(*engine.destroyed.lock(), destroyed);
}

#[tokio::test]
async fn test_destroy_empties_bucket_first() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    let publisher = RecordingPublisher::new();
    publisher.objects_in_bucket.store(3, std::sync::atomic::Ordering::SeqCst);
    let provisioner = Provisioner::new(engine.clone(), publisher.clone());

    provisioner.destroy(&assembly).await.unwrap();

    // Only the site stack holds the bucket
    assert_eq!(*publisher.emptied.lock(), vec![SITE_DOMAIN.to_string()]);
    assert_eq!(publisher.objects_in_bucket.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_destroy_stops_when_bucket_cannot_be_emptied() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    let publisher = RecordingPublisher::new();
    *publisher.fail_empty.lock() = true;
    let provisioner = Provisioner::new(engine.clone(), publisher.clone());

    let err = provisioner.destroy(&assembly).await.unwrap_err();
    assert!(matches!(err, Error::Publish { .. }));
    assert!(engine.destroyed.lock().is_empty());
}

#[tokio::test]
async fn test_diff_before_and_after_deploy() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let engine = RecordingEngine::new();
    let provisioner = Provisioner::new(engine.clone(), RecordingPublisher::new());

    let before = provisioner.diff(&assembly).await.unwrap();
    assert_eq!(before.len(), 2);
    assert!(before.iter().all(|d| !d.deployed && d.has_changes()));

    provisioner.deploy(&assembly, true).await.unwrap();

    let after = provisioner.diff(&assembly).await.unwrap();
    assert!(after.iter().all(|d| d.deployed && !d.has_changes()));

    // Drift on the deployed site template shows up as a change
    let mut drifted = engine.templates.lock()["NextjsStaticSite"].clone();
    drifted["Resources"]["SiteBucket"]["Properties"]["BucketName"] =
        serde_json::json!("old.dennisokeeffe.com");
    engine
        .templates
        .lock()
        .insert("NextjsStaticSite".to_string(), drifted);

    let drift = provisioner.diff(&assembly).await.unwrap();
    let site = drift.iter().find(|d| d.stack == "NextjsStaticSite").unwrap();
    assert_eq!((site.insertions, site.deletions), (1, 1));
    assert!(site.render(false).contains("-        \"BucketName\": \"old.dennisokeeffe.com\""));
}

#[tokio::test]
async fn test_report_orders_stacks() {
    let assets = asset_dir();
    let assembly = example_assembly(assets.path()).await;
    let provisioner = Provisioner::new(RecordingEngine::new(), RecordingPublisher::new());

    let report = provisioner.deploy(&assembly, true).await.unwrap();
    let order: Vec<&String> = report.stacks.keys().collect();
    assert_eq!(order, vec!["NextjsStaticSite-certificate", "NextjsStaticSite"]);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["stacks"]["NextjsStaticSite"]["DistributionId"].is_string());
    assert!(json["upload"].is_null());
}
