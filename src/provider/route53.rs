//! Hosted zone lookup against Route 53.

use super::aws::describe_error;
use super::ZoneLookup;
use crate::error::{Error, Result};
use crate::resources::{HostedZone, ZoneQuery};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53::Client;
use tracing::debug;

/// Looks zones up with `ListHostedZonesByName`
pub struct Route53ZoneLookup {
    client: Client,
}

impl Route53ZoneLookup {
    /// Create a lookup from loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ZoneLookup for Route53ZoneLookup {
    async fn find_zone(&self, query: &ZoneQuery) -> Result<Option<HostedZone>> {
        let resp = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(&query.domain_name)
            .send()
            .await
            .map_err(|e| Error::ZoneLookup {
                domain: query.domain_name.clone(),
                message: describe_error(&e),
            })?;

        // Results are sorted by name starting at `dns_name`, so the match, if
        // any, is among the first entries.
        for zone in resp.hosted_zones() {
            let private = zone.config().map(|c| c.private_zone()).unwrap_or(false);
            debug!(
                "Candidate zone {} ({}) private={}",
                zone.name(),
                zone.id(),
                private
            );
            if query.matches_name(zone.name()) && private == query.private_zone {
                return Ok(Some(HostedZone::new(zone.id(), zone.name())));
            }
        }

        Ok(None)
    }
}
