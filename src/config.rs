//! Configuration module for Sitestack
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - User configuration (~/.sitestack/config.toml)
//! - Project configuration (./sitestack.toml)
//! - Environment variables
//! - Command-line arguments (applied by the CLI on top of the loaded value)

use crate::error::{Error, ErrorContext, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default stack name, used when none is configured
pub const DEFAULT_STACK_NAME: &str = "StaticSite";

/// Default directory the cloud assembly is written to
pub const DEFAULT_OUTPUT_DIR: &str = "site.out";

/// Default context file caching lookup results
pub const DEFAULT_CONTEXT_FILE: &str = "sitestack.context.json";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Name of the site stack; the certificate stack is derived from it
    pub stack_name: String,

    /// Root domain of the existing hosted zone, e.g. `example.com`
    pub root_domain: String,

    /// Subdomain the site is served from, e.g. `www`
    pub sub_domain: String,

    /// Directory of pre-built static assets
    pub asset_dir: PathBuf,

    /// Where `synth` writes the cloud assembly
    pub output_dir: PathBuf,

    /// Cache of lookup results
    pub context_file: PathBuf,

    /// Account/region the site stack targets
    pub env: DeployEnvironment,

    /// Provisioning engine settings
    pub deploy: DeploySettings,

    /// Tags applied to every taggable resource and to the stacks
    pub tags: IndexMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            root_domain: String::new(),
            sub_domain: String::new(),
            asset_dir: PathBuf::from("out"),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            context_file: PathBuf::from(DEFAULT_CONTEXT_FILE),
            env: DeployEnvironment::default(),
            deploy: DeploySettings::default(),
            tags: IndexMap::new(),
        }
    }
}

/// Account and region context, passed explicitly instead of resolved ambiently
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployEnvironment {
    /// AWS account id (informational; credentials decide the real account)
    pub account: Option<String>,

    /// Deployment region for the site stack
    pub region: Option<String>,

    /// Named profile from the shared AWS config
    pub profile: Option<String>,
}

/// Provisioning engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    /// Seconds between stack status polls
    pub poll_interval_secs: u64,

    /// Give up waiting on a stack after this many minutes
    pub timeout_mins: u64,

    /// Concurrent object uploads
    pub upload_concurrency: usize,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            timeout_mins: 60,
            upload_concurrency: 8,
        }
    }
}

/// Files to read, and whether they were named by the user
struct ConfigSources {
    paths: Vec<PathBuf>,
    /// Named with `--config` or `$SITESTACK_CONFIG`; must exist
    explicit: bool,
}

impl ConfigSources {
    fn explicit(path: PathBuf) -> Self {
        Self {
            paths: vec![path],
            explicit: true,
        }
    }
}

impl SiteConfig {
    /// Create a configuration for a domain pair with defaults elsewhere
    pub fn new(root_domain: impl Into<String>, sub_domain: impl Into<String>) -> Self {
        Self {
            root_domain: root_domain.into(),
            sub_domain: sub_domain.into(),
            ..Self::default()
        }
    }

    /// Load configuration from all sources
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = SiteConfig::default();
        let sources = Self::get_config_paths(config_path);

        for path in sources.paths {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            } else if sources.explicit {
                return Err(Error::FileNotFound(path));
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&Path>) -> ConfigSources {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return ConfigSources::explicit(path.to_path_buf());
        }

        // Environment variable
        if let Ok(env_config) = std::env::var("SITESTACK_CONFIG") {
            return ConfigSources::explicit(PathBuf::from(env_config));
        }

        let mut paths = Vec::new();

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".sitestack/config.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("sitestack.toml"));
        paths.push(PathBuf::from("sitestack.yml"));
        paths.push(PathBuf::from("sitestack.json"));

        ConfigSources {
            paths,
            explicit: false,
        }
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Ok(self.merge(Self::parse(path, &content)?))
    }

    /// Parse a configuration document, picking the format from the extension
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => toml::from_str(content)?,
        };

        Ok(config)
    }

    /// Merge another config into this one
    fn merge(&self, other: SiteConfig) -> SiteConfig {
        let defaults = SiteConfig::default();

        // Other takes precedence for non-default values
        SiteConfig {
            stack_name: if other.stack_name != defaults.stack_name {
                other.stack_name
            } else {
                self.stack_name.clone()
            },
            root_domain: if other.root_domain.is_empty() {
                self.root_domain.clone()
            } else {
                other.root_domain
            },
            sub_domain: if other.sub_domain.is_empty() {
                self.sub_domain.clone()
            } else {
                other.sub_domain
            },
            asset_dir: if other.asset_dir != defaults.asset_dir {
                other.asset_dir
            } else {
                self.asset_dir.clone()
            },
            output_dir: if other.output_dir != defaults.output_dir {
                other.output_dir
            } else {
                self.output_dir.clone()
            },
            context_file: if other.context_file != defaults.context_file {
                other.context_file
            } else {
                self.context_file.clone()
            },
            env: DeployEnvironment {
                account: other.env.account.or_else(|| self.env.account.clone()),
                region: other.env.region.or_else(|| self.env.region.clone()),
                profile: other.env.profile.or_else(|| self.env.profile.clone()),
            },
            deploy: if other.deploy != defaults.deploy {
                other.deploy
            } else {
                self.deploy.clone()
            },
            tags: {
                let mut tags = self.tags.clone();
                tags.extend(other.tags);
                tags
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // SITESTACK_ROOT_DOMAIN
        if let Ok(domain) = std::env::var("SITESTACK_ROOT_DOMAIN") {
            self.root_domain = domain;
        }

        // SITESTACK_SUB_DOMAIN
        if let Ok(sub) = std::env::var("SITESTACK_SUB_DOMAIN") {
            self.sub_domain = sub;
        }

        // SITESTACK_STACK_NAME
        if let Ok(name) = std::env::var("SITESTACK_STACK_NAME") {
            self.stack_name = name;
        }

        // SITESTACK_ASSET_DIR
        if let Ok(dir) = std::env::var("SITESTACK_ASSET_DIR") {
            self.asset_dir = PathBuf::from(dir);
        }

        // SITESTACK_ACCOUNT
        if let Ok(account) = std::env::var("SITESTACK_ACCOUNT") {
            self.env.account = Some(account);
        }

        // SITESTACK_REGION
        if let Ok(region) = std::env::var("SITESTACK_REGION") {
            self.env.region = Some(region);
        }
    }

    /// Check the pre-conditions the assembler relies on
    pub fn validate(&self) -> Result<()> {
        if self.root_domain.trim().is_empty() {
            return Err(Error::invalid_config("root_domain", "must not be empty"));
        }
        if self.sub_domain.trim().is_empty() {
            return Err(Error::invalid_config("sub_domain", "must not be empty"));
        }
        validate_stack_name(&self.stack_name)?;
        if self.deploy.upload_concurrency == 0 {
            return Err(Error::invalid_config(
                "deploy.upload_concurrency",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Name of the stack holding the certificate
    pub fn certificate_stack_name(&self) -> String {
        format!("{}-certificate", self.stack_name)
    }
}

/// A stack name can contain only alphanumeric characters and hyphens. It must
/// start with a letter and can't be longer than 128 characters.
pub fn validate_stack_name(name: &str) -> Result<()> {
    let restriction = "must only contain alphanumeric characters and hyphens, start with a letter, and be at most 128 characters";
    let starts_alpha = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false);

    // The certificate stack appends "-certificate" (12 characters)
    if !starts_alpha
        || name.len() > 128 - 12
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(Error::invalid_config(
            "stack_name",
            format!("'{}' {}", name, restriction),
        ));
    }
    Ok(())
}
