//! Configuration loader describing the mirror disk and cache-map layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache_map::CACHE_MAP_EXTENSION;
use crate::paths::normalize_base_path;

const DEFAULT_CONFIG_FILE: &str = "mirror.config.json";

/// Discoverable configuration describing where internalized assets live and
/// how emitted URLs are formed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Root directory of the storage disk holding internalized assets.
    pub disk_root: String,
    /// Public base URL under which the storage disk is served.
    pub disk_url: String,
    /// Storage-relative base path that every internalized asset lives under.
    pub base_path: String,
    /// Query-string token appended to every emitted URL; empty disables it.
    pub cache_busting_token: String,
    /// Whether the persistent cache map is consulted and written at all.
    pub cache_map_enabled: bool,
    /// Directory holding the cache-map document.
    pub cache_map_root: String,
    /// File path prefix of the cache-map document, without extension.
    pub cache_map_path: String,
    /// Absolute local prefix stripped from identifiers and map keys.
    pub project_root: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            disk_root: "storage/app/public".into(),
            disk_url: "http://localhost/storage".into(),
            base_path: "internalized".into(),
            cache_busting_token: String::new(),
            cache_map_enabled: true,
            cache_map_root: "storage/app".into(),
            cache_map_path: "mirror/cache-map".into(),
            project_root: String::new(),
        }
    }
}

impl MirrorConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// When the configuration file does not exist or fails to parse we fall
    /// back to default values so downstream callers can continue operating
    /// with sensible assumptions.
    pub fn discover(dir: &Path) -> Self {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        Self::from_path(&candidate).unwrap_or_default()
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Resolved settings consumed by the engine.
    pub fn settings(&self) -> MirrorSettings {
        MirrorSettings {
            base_path: normalize_base_path(&self.base_path),
            cache_busting_token: self.cache_busting_token.clone(),
            project_root: self.project_root.clone(),
        }
    }

    /// Location of the persisted cache-map document.
    pub fn cache_map_file(&self) -> PathBuf {
        Path::new(&self.cache_map_root)
            .join(format!("{}.{}", self.cache_map_path, CACHE_MAP_EXTENSION))
    }
}

/// Values resolved from configuration before the engine is constructed.
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    /// Base internalization path, normalized to end with a separator.
    pub base_path: String,
    /// Cache-busting token appended (prefixed with `?`) to emitted URLs.
    pub cache_busting_token: String,
    /// Absolute local prefix stripped from identifiers.
    pub project_root: String,
}
