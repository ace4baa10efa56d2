//! Error types for Sitestack.
//!
//! This module defines the error types used throughout Sitestack. Errors fall in
//! three groups: pre-condition failures detected before anything is declared,
//! provider-side failures surfaced verbatim from AWS, and dependency-ordering
//! failures raised while stacks are applied in order.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Sitestack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Sitestack.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Pre-condition Errors
    // ========================================================================
    /// No hosted zone matches the root domain.
    #[error("No hosted zone found for domain '{domain}'")]
    ZoneNotFound {
        /// Root domain that was looked up
        domain: String,
    },

    /// A lookup was needed but lookups are disabled and the context has no entry.
    #[error("Context lookups are disabled and no cached value exists for '{key}'")]
    LookupsDisabled {
        /// Context key that was missing
        key: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Asset directory for the content deployment is missing.
    #[error("Asset directory not found: {0}")]
    AssetDirectoryNotFound(PathBuf),

    /// An assembled stack broke one of its invariants.
    #[error("Assembly invariant violated: {0}")]
    AssemblyInvariant(String),

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// Hosted zone lookup failed at the provider.
    #[error("Hosted zone lookup for '{domain}' failed: {message}")]
    ZoneLookup {
        /// Root domain that was looked up
        domain: String,
        /// Error message
        message: String,
    },

    /// Stack create/update failed.
    #[error("Deployment of stack '{stack}' failed: {message}")]
    StackDeploy {
        /// Stack name
        stack: String,
        /// Error message
        message: String,
    },

    /// Stack deletion failed.
    #[error("Destroy of stack '{stack}' failed: {message}")]
    StackDestroy {
        /// Stack name
        stack: String,
        /// Error message
        message: String,
    },

    /// Content upload failed.
    #[error("Publishing content to bucket '{bucket}' failed: {message}")]
    Publish {
        /// Destination bucket
        bucket: String,
        /// Error message
        message: String,
    },

    /// Cache invalidation failed.
    #[error("Invalidation of distribution '{distribution}' failed: {message}")]
    Invalidation {
        /// Distribution id
        distribution: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Dependency Errors
    // ========================================================================
    /// A stack was applied before a stack it depends on.
    #[error("Stack '{stack}' depends on '{dependency}', which has not been deployed")]
    DependencyOrder {
        /// Stack being deployed
        stack: String,
        /// Missing dependency
        dependency: String,
    },

    /// An upstream stack did not export an output a later step needs.
    #[error("Stack '{stack}' has no output '{output}'")]
    MissingOutput {
        /// Stack name
        stack: String,
        /// Output key
        output: String,
    },

    /// The resource graph contains a cycle.
    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// A referenced resource is not in the graph.
    #[error("Resource '{0}' not found in graph")]
    UnknownResource(String),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new invalid config error.
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new stack deploy error.
    pub fn stack_deploy(stack: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StackDeploy {
            stack: stack.into(),
            message: message.into(),
        }
    }

    /// Creates a new stack destroy error.
    pub fn stack_destroy(stack: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StackDestroy {
            stack: stack.into(),
            message: message.into(),
        }
    }

    /// Creates a new publish error.
    pub fn publish(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            bucket: bucket.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error was raised before anything was declared or applied.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::ZoneNotFound { .. }
                | Error::LookupsDisabled { .. }
                | Error::Config(_)
                | Error::InvalidConfig { .. }
                | Error::AssetDirectoryNotFound(_)
        )
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ZoneNotFound { .. }
            | Error::LookupsDisabled { .. }
            | Error::ZoneLookup { .. } => 2,
            Error::Config(_)
            | Error::InvalidConfig { .. }
            | Error::AssetDirectoryNotFound(_)
            | Error::AssemblyInvariant(_) => 3,
            Error::StackDeploy { .. } | Error::StackDestroy { .. } => 4,
            Error::Publish { .. } | Error::Invalidation { .. } => 5,
            Error::DependencyOrder { .. }
            | Error::MissingOutput { .. }
            | Error::DependencyCycle(_)
            | Error::UnknownResource(_) => 6,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
