//! Local asset scanning and sync planning.
//!
//! Objects are compared by MD5: S3 reports a single-part upload's MD5 as its
//! ETag, so a matching ETag means the object is already current. Multipart
//! ETags never match and those objects are simply uploaded again.

use crate::error::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file in the asset directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    /// Object key (path relative to the asset directory, `/`-separated)
    pub key: String,
    /// File on disk
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex MD5 of the content
    pub md5: String,
}

/// An object already in the bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Object key
    pub key: String,
    /// ETag as returned by S3, quotes included
    pub etag: Option<String>,
}

/// What a sync has to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// New or changed files
    pub upload: Vec<LocalAsset>,
    /// Keys already current
    pub unchanged: Vec<String>,
    /// Remote keys with no local file
    pub delete: Vec<String>,
}

impl SyncPlan {
    /// Total bytes to upload
    pub fn upload_bytes(&self) -> u64 {
        self.upload.iter().map(|a| a.size).sum()
    }
}

/// Scan `dir` recursively, in key order
pub fn collect_assets(dir: &Path) -> Result<Vec<LocalAsset>> {
    if !dir.is_dir() {
        return Err(Error::AssetDirectoryNotFound(dir.to_path_buf()));
    }

    let mut assets = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| Error::Internal(e.to_string()))?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let content = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;

        assets.push(LocalAsset {
            key,
            path: entry.path().to_path_buf(),
            size: content.len() as u64,
            md5: format!("{:x}", md5::compute(&content)),
        });
    }

    assets.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(assets)
}

/// Decide which assets to upload, which to leave and which remote keys to prune
pub fn plan_sync(local: Vec<LocalAsset>, remote: &[RemoteObject], prune: bool) -> SyncPlan {
    let remote_etags: HashMap<&str, Option<&str>> = remote
        .iter()
        .map(|o| (o.key.as_str(), o.etag.as_deref().map(|e| e.trim_matches('"'))))
        .collect();

    let mut plan = SyncPlan::default();

    if prune {
        let local_keys: std::collections::HashSet<&str> =
            local.iter().map(|a| a.key.as_str()).collect();
        plan.delete = remote
            .iter()
            .filter(|o| !local_keys.contains(o.key.as_str()))
            .map(|o| o.key.clone())
            .collect();
        plan.delete.sort();
    }

    for asset in local {
        match remote_etags.get(asset.key.as_str()) {
            Some(Some(etag)) if *etag == asset.md5 => plan.unchanged.push(asset.key),
            _ => plan.upload.push(asset),
        }
    }

    plan
}

/// Content type for an object key, by extension
pub fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "webmanifest" => "application/manifest+json",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
