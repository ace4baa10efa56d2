//! Content deployment: local assets synced to the bucket, then a cache purge.
//!
//! Unlike the other resources this one is not rendered into a template. It is
//! carried in the cloud assembly and executed by a
//! [`ContentPublisher`](crate::provider::ContentPublisher) once the stacks
//! are up.

use crate::assembly::OutputRef;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Paths invalidated after every content sync
pub const INVALIDATION_PATHS: &[&str] = &["/*"];

/// Sync of a local asset directory into the site bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDeployment {
    id: String,
    source: PathBuf,
    destination_bucket: String,
    distribution: OutputRef,
    prune: bool,
    invalidation_paths: Vec<String>,
}

impl BucketDeployment {
    /// Declare a deployment of `source` into `destination_bucket`, invalidating
    /// the distribution whose id is exported as `distribution`.
    ///
    /// Fails with [`Error::AssetDirectoryNotFound`] when `source` is not a
    /// directory.
    pub fn new(
        id: impl Into<String>,
        source: &Path,
        destination_bucket: impl Into<String>,
        distribution: OutputRef,
    ) -> Result<Self> {
        if !source.is_dir() {
            return Err(Error::AssetDirectoryNotFound(source.to_path_buf()));
        }

        Ok(Self {
            id: id.into(),
            source: source.to_path_buf(),
            destination_bucket: destination_bucket.into(),
            distribution,
            prune: true,
            invalidation_paths: INVALIDATION_PATHS.iter().map(|p| p.to_string()).collect(),
        })
    }

    /// Deployment id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Local asset directory
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Bucket the assets land in
    pub fn destination_bucket(&self) -> &str {
        &self.destination_bucket
    }

    /// Stack output carrying the distribution id
    pub fn distribution(&self) -> &OutputRef {
        &self.distribution
    }

    /// Remove remote objects that no longer exist locally
    pub fn prune(&self) -> bool {
        self.prune
    }

    /// Always exactly `["/*"]`
    pub fn invalidation_paths(&self) -> &[String] {
        &self.invalidation_paths
    }
}
