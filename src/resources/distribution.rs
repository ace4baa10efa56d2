//! CloudFront distribution fronting the bucket website endpoint.

use super::intrinsic::{get_att, reference};
use super::CfnResource;
use crate::domain::SiteDomain;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const ORIGIN_ID: &str = "SiteBucketOrigin";

/// Distribution-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSettings {
    /// Object served for `/`
    pub default_root_object: String,
    /// Edge location footprint
    pub price_class: String,
    /// Highest HTTP version served to viewers
    pub http_version: String,
    /// Serve over IPv6
    pub ipv6_enabled: bool,
    /// How TLS is served for the alias names
    pub ssl_support_method: String,
    /// Oldest TLS protocol negotiated with viewers
    pub minimum_protocol_version: String,
    /// How the distribution talks to the origin
    pub origin_protocol_policy: String,
    /// How viewers using plain HTTP are handled
    pub viewer_protocol_policy: String,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            default_root_object: "index.html".to_string(),
            price_class: "PriceClass_100".to_string(),
            http_version: "http2".to_string(),
            ipv6_enabled: true,
            ssl_support_method: "sni-only".to_string(),
            minimum_protocol_version: "TLSv1.1_2016".to_string(),
            origin_protocol_policy: "http-only".to_string(),
            viewer_protocol_policy: "redirect-to-https".to_string(),
        }
    }
}

/// Distribution with one custom origin and a single default behavior
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDistribution {
    logical_id: String,
    aliases: Vec<String>,
    certificate_arn: Value,
    origin_domain: Value,
    settings: DistributionSettings,
}

impl SiteDistribution {
    /// Declare a distribution serving `domain` from `origin_domain` with the
    /// certificate resolved from `certificate_arn`
    pub fn new(
        logical_id: impl Into<String>,
        domain: &SiteDomain,
        certificate_arn: Value,
        origin_domain: Value,
    ) -> Self {
        Self {
            logical_id: logical_id.into(),
            aliases: vec![domain.name().to_string()],
            certificate_arn,
            origin_domain,
            settings: DistributionSettings::default(),
        }
    }

    /// Alternate domain names
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Distribution-wide settings
    pub fn settings(&self) -> &DistributionSettings {
        &self.settings
    }

    /// `Ref` to the distribution, which resolves to its id
    pub fn id_ref(&self) -> Value {
        reference(&self.logical_id)
    }

    /// The `*.cloudfront.net` domain name
    pub fn domain_name(&self) -> Value {
        get_att(&self.logical_id, "DomainName")
    }
}

impl CfnResource for SiteDistribution {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::Distribution"
    }

    fn properties(&self) -> Value {
        let s = &self.settings;
        json!({
            "DistributionConfig": {
                "Aliases": self.aliases,
                "DefaultCacheBehavior": {
                    "AllowedMethods": ["GET", "HEAD"],
                    "CachedMethods": ["GET", "HEAD"],
                    "Compress": true,
                    "ForwardedValues": {
                        "Cookies": { "Forward": "none" },
                        "QueryString": false
                    },
                    "TargetOriginId": ORIGIN_ID,
                    "ViewerProtocolPolicy": s.viewer_protocol_policy
                },
                "DefaultRootObject": s.default_root_object,
                "Enabled": true,
                "HttpVersion": s.http_version,
                "IPV6Enabled": s.ipv6_enabled,
                "Origins": [{
                    "CustomOriginConfig": {
                        "HTTPPort": 80,
                        "HTTPSPort": 443,
                        "OriginProtocolPolicy": s.origin_protocol_policy,
                        "OriginSSLProtocols": ["TLSv1.2"]
                    },
                    "DomainName": self.origin_domain,
                    "Id": ORIGIN_ID
                }],
                "PriceClass": s.price_class,
                "ViewerCertificate": {
                    "AcmCertificateArn": self.certificate_arn,
                    "MinimumProtocolVersion": s.minimum_protocol_version,
                    "SslSupportMethod": s.ssl_support_method
                }
            }
        })
    }
}
