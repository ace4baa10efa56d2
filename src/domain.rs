//! Site domain derivation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fully qualified name the site is served from.
///
/// Always `sub_domain + "." + root_domain`. Every resource that names the site
/// (bucket, certificate, distribution alias, DNS record) takes its string from
/// one `SiteDomain`, so they cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteDomain {
    root: String,
    sub: String,
    name: String,
}

impl SiteDomain {
    /// Derive the site domain from its two parts.
    ///
    /// Only emptiness is checked; label syntax is left to the provider.
    pub fn derive(root_domain: &str, sub_domain: &str) -> Result<Self> {
        if root_domain.trim().is_empty() {
            return Err(Error::invalid_config("root_domain", "must not be empty"));
        }
        if sub_domain.trim().is_empty() {
            return Err(Error::invalid_config("sub_domain", "must not be empty"));
        }

        Ok(Self {
            root: root_domain.to_string(),
            sub: sub_domain.to_string(),
            name: format!("{}.{}", sub_domain, root_domain),
        })
    }

    /// The derived fully qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root domain (the hosted zone's name)
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The subdomain label(s)
    pub fn sub(&self) -> &str {
        &self.sub
    }

    /// Public URL of the site
    pub fn url(&self) -> String {
        format!("https://{}", self.name)
    }
}

impl fmt::Display for SiteDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for SiteDomain {
    fn as_ref(&self) -> &str {
        &self.name
    }
}
