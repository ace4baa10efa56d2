//! Content publishing to S3 and cache invalidation on CloudFront.
//!
//! The sync itself runs against [`ObjectStore`], so the planning, upload
//! fan-out and pruning are independent of the S3 client.

use super::assets::{collect_assets, content_type_for, plan_sync, LocalAsset, RemoteObject};
use super::aws::describe_error;
use super::{ContentPublisher, UploadSummary};
use crate::error::{Error, Result};
use crate::resources::BucketDeployment;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// `DeleteObjects` accepts at most this many keys per call
const DELETE_BATCH: usize = 1000;

/// Object operations a content sync needs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every object in `bucket`; empty when the bucket does not exist
    async fn list(&self, bucket: &str) -> Result<Vec<RemoteObject>>;

    /// Write one asset, returning the bytes written
    async fn put(&self, bucket: &str, asset: &LocalAsset) -> Result<u64>;

    /// Remove `keys` from `bucket`
    async fn delete(&self, bucket: &str, keys: &[String]) -> Result<()>;
}

/// Sync the deployment's asset directory into `bucket`, at most
/// `concurrency` uploads in flight
pub async fn sync_bucket(
    store: &dyn ObjectStore,
    deployment: &BucketDeployment,
    bucket: &str,
    concurrency: usize,
) -> Result<UploadSummary> {
    let local = collect_assets(deployment.source())?;
    let remote = store.list(bucket).await?;
    let plan = plan_sync(local, &remote, deployment.prune());

    info!(
        "Syncing {} to s3://{}: {} to upload ({} bytes), {} unchanged, {} to prune",
        deployment.source().display(),
        bucket,
        plan.upload.len(),
        plan.upload_bytes(),
        plan.unchanged.len(),
        plan.delete.len()
    );

    let uploads: Vec<_> = plan.upload.iter().map(|asset| store.put(bucket, asset)).collect();
    let bytes: u64 = stream::iter(uploads)
        .buffer_unordered(concurrency.max(1))
        .try_fold(0u64, |total, size| async move { Ok(total + size) })
        .await?;

    if !plan.delete.is_empty() {
        store.delete(bucket, &plan.delete).await?;
    }

    Ok(UploadSummary {
        uploaded: plan.upload.len(),
        skipped: plan.unchanged.len(),
        deleted: plan.delete.len(),
        bytes,
    })
}

/// Delete every object in `bucket`, returning how many were removed
pub async fn empty_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<usize> {
    let keys: Vec<String> = store
        .list(bucket)
        .await?
        .into_iter()
        .map(|o| o.key)
        .collect();

    if !keys.is_empty() {
        store.delete(bucket, &keys).await?;
    }
    info!("Emptied s3://{} ({} objects)", bucket, keys.len());
    Ok(keys.len())
}

/// [`ObjectStore`] over the S3 API
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Create a store from loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, bucket: &str) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let resp = match self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(token.take())
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) if e.as_service_error().map(|s| s.is_no_such_bucket()).unwrap_or(false) => {
                    debug!("Bucket {} does not exist", bucket);
                    return Ok(Vec::new());
                }
                Err(e) => return Err(Error::publish(bucket, describe_error(&e))),
            };

            for object in resp.contents() {
                if let Some(key) = object.key() {
                    objects.push(RemoteObject {
                        key: key.to_string(),
                        etag: object.e_tag().map(str::to_string),
                    });
                }
            }

            match resp.next_continuation_token() {
                Some(next) if resp.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string())
                }
                _ => break,
            }
        }

        debug!("Bucket {} holds {} objects", bucket, objects.len());
        Ok(objects)
    }

    async fn put(&self, bucket: &str, asset: &LocalAsset) -> Result<u64> {
        let body = ByteStream::from_path(&asset.path)
            .await
            .map_err(|e| Error::publish(bucket, format!("{}: {}", asset.path.display(), e)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(&asset.key)
            .content_type(content_type_for(&asset.key))
            .body(body)
            .send()
            .await
            .map_err(|e| Error::publish(bucket, format!("{}: {}", asset.key, describe_error(&e))))?;

        debug!("Uploaded s3://{}/{} ({} bytes)", bucket, asset.key, asset.size);
        Ok(asset.size)
    }

    async fn delete(&self, bucket: &str, keys: &[String]) -> Result<()> {
        for batch in keys.chunks(DELETE_BATCH) {
            let objects = batch
                .iter()
                .map(|k| {
                    ObjectIdentifier::builder()
                        .key(k)
                        .build()
                        .map_err(|e| Error::publish(bucket, e.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| Error::publish(bucket, e.to_string()))?;

            self.client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| Error::publish(bucket, describe_error(&e)))?;
        }
        Ok(())
    }
}

/// Publishes through the S3 and CloudFront APIs
pub struct AwsContentPublisher {
    store: Arc<dyn ObjectStore>,
    cloudfront: aws_sdk_cloudfront::Client,
    concurrency: usize,
}

impl AwsContentPublisher {
    /// Create a publisher from loaded SDK configuration
    pub fn new(config: &SdkConfig, concurrency: usize) -> Self {
        Self {
            store: Arc::new(S3ObjectStore::new(config)),
            cloudfront: aws_sdk_cloudfront::Client::new(config),
            concurrency: concurrency.max(1),
        }
    }
}

#[async_trait]
impl ContentPublisher for AwsContentPublisher {
    async fn upload(&self, deployment: &BucketDeployment, bucket: &str) -> Result<UploadSummary> {
        sync_bucket(self.store.as_ref(), deployment, bucket, self.concurrency).await
    }

    async fn empty_bucket(&self, bucket: &str) -> Result<usize> {
        empty_bucket(self.store.as_ref(), bucket).await
    }

    async fn invalidate(&self, distribution_id: &str, paths: &[String]) -> Result<String> {
        let invalidation_error = |message: String| Error::Invalidation {
            distribution: distribution_id.to_string(),
            message,
        };

        let paths = Paths::builder()
            .quantity(paths.len() as i32)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|e| invalidation_error(e.to_string()))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(uuid::Uuid::new_v4().to_string())
            .build()
            .map_err(|e| invalidation_error(e.to_string()))?;

        let resp = self
            .cloudfront
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| invalidation_error(describe_error(&e)))?;

        let id = resp
            .invalidation()
            .map(|i| i.id().to_string())
            .unwrap_or_default();
        info!("Created invalidation {} on {}", id, distribution_id);
        Ok(id)
    }
}
