//! Route 53 alias record pointing the site domain at the distribution.

use super::zone::HostedZone;
use super::CfnResource;
use crate::domain::SiteDomain;
use serde_json::{json, Value};

/// Fixed hosted zone id of every CloudFront distribution's alias target
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// An `A` record aliased to a CloudFront distribution
#[derive(Debug, Clone, PartialEq)]
pub struct AliasRecord {
    logical_id: String,
    hosted_zone_id: String,
    record_name: String,
    target_dns_name: Value,
}

impl AliasRecord {
    /// Alias `domain` in `zone` to the distribution reachable at `target_dns_name`
    pub fn cloudfront_target(
        logical_id: impl Into<String>,
        zone: &HostedZone,
        domain: &SiteDomain,
        target_dns_name: Value,
    ) -> Self {
        Self {
            logical_id: logical_id.into(),
            hosted_zone_id: zone.hosted_zone_id.clone(),
            record_name: domain.name().to_string(),
            target_dns_name,
        }
    }

    /// Record name
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Zone the record lives in
    pub fn hosted_zone_id(&self) -> &str {
        &self.hosted_zone_id
    }
}

impl CfnResource for AliasRecord {
    fn logical_id(&self) -> &str {
        &self.logical_id
    }

    fn type_string(&self) -> &'static str {
        "AWS::Route53::RecordSet"
    }

    fn properties(&self) -> Value {
        json!({
            "AliasTarget": {
                "DNSName": self.target_dns_name,
                "EvaluateTargetHealth": false,
                "HostedZoneId": CLOUDFRONT_HOSTED_ZONE_ID
            },
            "HostedZoneId": self.hosted_zone_id,
            "Name": format!("{}.", self.record_name),
            "Type": "A"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::intrinsic::get_att;

    #[test]
    fn test_alias_not_cname() {
        let domain = SiteDomain::derive("example.com", "www").unwrap();
        let zone = HostedZone::new("Z0ABC", "example.com");
        let record = AliasRecord::cloudfront_target(
            "SiteAliasRecord",
            &zone,
            &domain,
            get_att("SiteDistribution", "DomainName"),
        );
        let rendered = record.render();
        let props = &rendered["Properties"];
        assert_eq!(props["Type"], "A");
        assert_eq!(props["Name"], "www.example.com.");
        assert_eq!(props["HostedZoneId"], "Z0ABC");
        assert_eq!(props["AliasTarget"]["HostedZoneId"], "Z2FDTNDATAQYW2");
        assert!(props.get("ResourceRecords").is_none());
    }
}
