//! Hosted zone references and the lookup query that resolves them.

use serde::{Deserialize, Serialize};

/// An existing Route 53 hosted zone, resolved by lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Zone id without the `/hostedzone/` prefix
    #[serde(rename = "Id")]
    pub hosted_zone_id: String,

    /// Zone name without the trailing dot
    #[serde(rename = "Name")]
    pub zone_name: String,
}

impl HostedZone {
    /// Build a zone reference from raw provider values.
    ///
    /// Route 53 returns ids as `/hostedzone/Z123` and names with a trailing
    /// dot; both are normalized away.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            hosted_zone_id: id.trim_start_matches("/hostedzone/").to_string(),
            zone_name: name.trim_end_matches('.').to_string(),
        }
    }
}

/// Parameters of a hosted zone lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneQuery {
    /// Domain the zone is named after
    pub domain_name: String,
    /// Account performing the lookup
    pub account: Option<String>,
    /// Region performing the lookup
    pub region: Option<String>,
    /// Match private zones instead of public ones
    pub private_zone: bool,
}

impl ZoneQuery {
    /// Query for the public zone named `domain_name`
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            account: None,
            region: None,
            private_zone: false,
        }
    }

    /// Scope the query to an account and region
    pub fn with_env(mut self, account: Option<String>, region: Option<String>) -> Self {
        self.account = account;
        self.region = region;
        self
    }

    /// Key under which the result is cached in the context file
    pub fn context_key(&self) -> String {
        let mut key = format!(
            "hosted-zone:account={}:domainName={}:region={}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.domain_name,
            self.region.as_deref().unwrap_or("unknown-region"),
        );
        if self.private_zone {
            key.push_str(":privateZone=true");
        }
        key
    }

    /// Whether a zone name returned by the provider matches this query
    pub fn matches_name(&self, zone_name: &str) -> bool {
        zone_name.trim_end_matches('.') == self.domain_name.trim_end_matches('.')
    }
}
