//! The content bucket and its public-read policy.

use super::intrinsic::{get_att, reference, select, split, sub};
use super::{CfnResource, RemovalPolicy};
use crate::domain::SiteDomain;
use serde_json::{json, Value};

/// Website index document
pub const INDEX_DOCUMENT: &str = "index.html";

/// Website error document
pub const ERROR_DOCUMENT: &str = "error.html";

/// S3 bucket configured for static website hosting.
///
/// The bucket is named after the site domain and is always destroyed together
/// with its stack; there is no setting that changes the removal policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteBucket {
    logical_id: String,
    bucket_name: String,
}

impl SiteBucket {
    /// Declare the bucket for `domain`
    pub fn new(logical_id: impl Into<String>, domain: &SiteDomain) -> Self {
        Self {
            logical_id: logical_id.into(),
            bucket_name: domain.name().to_string(),
        }
    }

    /// Physical bucket name
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Removal policy, fixed to [`RemovalPolicy::Destroy`]
    pub fn removal_policy(&self) -> RemovalPolicy {
        RemovalPolicy::Destroy
    }

    /// `Ref` to the bucket, which resolves to its name
    pub fn name_ref(&self) -> Value {
        reference(&self.logical_id)
    }

    /// Website endpoint host, e.g. `site.s3-website-us-west-2.amazonaws.com`.
    ///
    /// `WebsiteURL` is `http://<host>`; splitting on `/` leaves the host at
    /// index 2.
    pub fn website_domain(&self) -> Value {
        select(2, split("/", get_att(&self.logical_id, "WebsiteURL")))
    }
}

impl CfnResource for SiteBucket {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn type_string(&self) -> &'static str {
        "AWS::S3::Bucket"
    }

    fn properties(&self) -> Value {
        json!({
            "BucketName": self.bucket_name,
            "PublicAccessBlockConfiguration": {
                "BlockPublicAcls": false,
                "BlockPublicPolicy": false,
                "IgnorePublicAcls": false,
                "RestrictPublicBuckets": false
            },
            "WebsiteConfiguration": {
                "IndexDocument": INDEX_DOCUMENT,
                "ErrorDocument": ERROR_DOCUMENT
            }
        })
    }

    fn deletion_policy(&self) -> Option<RemovalPolicy> {
        Some(self.removal_policy())
    }
}

/// Grants anonymous `s3:GetObject` on every object in the bucket
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPolicy {
    logical_id: String,
    bucket_logical_id: String,
}

impl BucketPolicy {
    /// Public-read policy for `bucket`
    pub fn public_read(logical_id: impl Into<String>, bucket: &SiteBucket) -> Self {
        Self {
            logical_id: logical_id.into(),
            bucket_logical_id: bucket.logical_id().to_string(),
        }
    }

    /// Logical id of the bucket the policy is attached to
    pub fn bucket_logical_id(&self) -> &str {
        &self.bucket_logical_id
    }
}

impl CfnResource for BucketPolicy {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn type_string(&self) -> &'static str {
        "AWS::S3::BucketPolicy"
    }

    fn properties(&self) -> Value {
        json!({
            "Bucket": reference(&self.bucket_logical_id),
            "PolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "s3:GetObject",
                    "Effect": "Allow",
                    "Principal": "*",
                    "Resource": sub(&format!(
                        "arn:${{AWS::Partition}}:s3:::${{{}}}/*",
                        self.bucket_logical_id
                    ))
                }]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> SiteBucket {
        let domain = SiteDomain::derive("example.com", "www").unwrap();
        SiteBucket::new("SiteBucket", &domain)
    }

    #[test]
    fn test_bucket_named_after_domain() {
        let rendered = bucket().render();
        assert_eq!(rendered["Type"], "AWS::S3::Bucket");
        assert_eq!(rendered["Properties"]["BucketName"], "www.example.com");
        assert_eq!(
            rendered["Properties"]["WebsiteConfiguration"]["IndexDocument"],
            "index.html"
        );
        assert_eq!(
            rendered["Properties"]["WebsiteConfiguration"]["ErrorDocument"],
            "error.html"
        );
    }

    #[test]
    fn test_bucket_is_destroyed_with_stack() {
        let rendered = bucket().render();
        assert_eq!(rendered["DeletionPolicy"], "Delete");
        assert_eq!(rendered["UpdateReplacePolicy"], "Delete");
    }

    #[test]
    fn test_policy_grants_public_get() {
        let policy = BucketPolicy::public_read("SiteBucketPolicy", &bucket());
        let rendered = policy.render();
        let statement = &rendered["Properties"]["PolicyDocument"]["Statement"][0];
        assert_eq!(statement["Action"], "s3:GetObject");
        assert_eq!(statement["Principal"], "*");
        assert_eq!(
            statement["Resource"]["Fn::Sub"],
            "arn:${AWS::Partition}:s3:::${SiteBucket}/*"
        );
        assert_eq!(rendered["Properties"]["Bucket"]["Ref"], "SiteBucket");
    }
}
