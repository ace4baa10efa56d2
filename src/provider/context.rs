//! Context file caching lookup results.
//!
//! The first successful lookup for a key is written to the context file and
//! reused by every later run, which keeps synthesis repeatable and lets it run
//! offline. With lookups disabled a cache miss is an error instead of a
//! provider call.

use super::ZoneLookup;
use crate::error::{Error, ErrorContext, Result};
use crate::resources::{HostedZone, ZoneQuery};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Caching wrapper around another [`ZoneLookup`]
pub struct ContextLookup {
    path: PathBuf,
    inner: Option<Arc<dyn ZoneLookup>>,
    entries: Mutex<IndexMap<String, Value>>,
}

impl ContextLookup {
    /// Open the context file at `path`.
    ///
    /// A missing file starts an empty cache. When `inner` is `None` lookups
    /// are disabled and only cached entries are served.
    pub fn open(path: impl Into<PathBuf>, inner: Option<Arc<dyn ZoneLookup>>) -> Result<Self> {
        let path = path.into();
        let entries = Self::read_entries(&path)?;
        debug!(
            "Loaded {} context entries from {}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            path,
            inner,
            entries: Mutex::new(entries),
        })
    }

    fn read_entries(path: &Path) -> Result<IndexMap<String, Value>> {
        if !path.exists() {
            return Ok(IndexMap::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(IndexMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Path of the context file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether cache misses may call the provider
    pub fn lookups_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Snapshot of the cached entries
    pub fn entries(&self) -> IndexMap<String, Value> {
        self.entries.lock().clone()
    }

    /// Drop every cached entry and remove the file; returns how many were dropped
    pub fn clear(&self) -> Result<usize> {
        let removed = {
            let mut entries = self.entries.lock();
            let count = entries.len();
            entries.clear();
            count
        };
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        info!("Cleared {} context entries", removed);
        Ok(removed)
    }

    fn store(&self, key: String, value: Value) -> Result<()> {
        let snapshot = {
            let mut entries = self.entries.lock();
            entries.insert(key, value);
            entries.clone()
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&snapshot)? + "\n")
            .with_context(|| format!("Failed to write context file: {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ZoneLookup for ContextLookup {
    async fn find_zone(&self, query: &ZoneQuery) -> Result<Option<HostedZone>> {
        let key = query.context_key();

        let cached = self.entries.lock().get(&key).cloned();
        if let Some(value) = cached {
            debug!("Context hit for {}", key);
            return Ok(Some(serde_json::from_value(value)?));
        }

        let Some(inner) = &self.inner else {
            return Err(Error::LookupsDisabled { key });
        };

        debug!("Context miss for {}, querying provider", key);
        let zone = inner.find_zone(query).await?;
        if let Some(zone) = &zone {
            self.store(key, serde_json::to_value(zone)?)?;
            info!(
                "Cached hosted zone {} in {}",
                zone.zone_name,
                self.path.display()
            );
        }
        Ok(zone)
    }
}
