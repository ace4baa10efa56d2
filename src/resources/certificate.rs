//! DNS-validated ACM certificate.

use super::zone::HostedZone;
use super::CfnResource;
use crate::domain::SiteDomain;
use serde_json::{json, Value};

/// CloudFront only reads viewer certificates from this region.
pub const CERTIFICATE_REGION: &str = "us-east-1";

/// Certificate for the site domain, validated through records in the zone
#[derive(Debug, Clone, PartialEq)]
pub struct DnsValidatedCertificate {
    logical_id: String,
    domain_name: String,
    hosted_zone_id: String,
}

impl DnsValidatedCertificate {
    /// Declare a certificate for `domain` validated in `zone`
    pub fn new(logical_id: impl Into<String>, domain: &SiteDomain, zone: &HostedZone) -> Self {
        Self {
            logical_id: logical_id.into(),
            domain_name: domain.name().to_string(),
            hosted_zone_id: zone.hosted_zone_id.clone(),
        }
    }

    /// Domain the certificate covers
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Zone the validation records are written to
    pub fn hosted_zone_id(&self) -> &str {
        &self.hosted_zone_id
    }

    /// Region the certificate is issued in
    pub fn region(&self) -> &'static str {
        CERTIFICATE_REGION
    }
}

impl CfnResource for DnsValidatedCertificate {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn type_string(&self) -> &'static str {
        "AWS::CertificateManager::Certificate"
    }

    fn properties(&self) -> Value {
        json!({
            "DomainName": self.domain_name,
            "DomainValidationOptions": [{
                "DomainName": self.domain_name,
                "HostedZoneId": self.hosted_zone_id
            }],
            "ValidationMethod": "DNS"
        })
    }
}
