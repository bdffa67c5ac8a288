//! Persistent identifier → storage-path index surviving across runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::paths::normalize_base_path;

/// File extension of the persisted cache-map document.
pub const CACHE_MAP_EXTENSION: &str = "basset";

/// Persistent key → value store mapping asset identifiers to their resolved
/// storage-relative paths.
///
/// Backed by a single flat JSON document loaded once at construction and
/// flushed once via [`CacheMap::save`]. Keys are normalized so entries stay
/// portable across environments with different absolute base paths. When
/// disabled by configuration every operation is a complete no-op and no file
/// I/O happens at all.
#[derive(Debug)]
pub struct CacheMap {
    enabled: bool,
    file: PathBuf,
    disk_url: String,
    base_path: String,
    project_root: String,
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl CacheMap {
    /// Load the map from its backing file; an absent or unreadable file is
    /// an empty map, not an error.
    pub fn load(
        enabled: bool,
        file: impl Into<PathBuf>,
        disk_url: &str,
        base_path: &str,
        project_root: &str,
    ) -> Self {
        let file = file.into();
        let entries = if enabled {
            read_entries(&file)
        } else {
            BTreeMap::new()
        };
        Self {
            enabled,
            file,
            disk_url: disk_url.trim_end_matches('/').to_string(),
            base_path: normalize_base_path(base_path),
            project_root: project_root.to_string(),
            entries,
            dirty: false,
        }
    }

    /// Record the resolved storage path for an identifier.
    ///
    /// The stored value is relative to the configured base path and carries
    /// a leading `/`; the disk base URL and base path prefixes are stripped
    /// on the way in so [`CacheMap::get`] can reconstruct the absolute URL.
    /// Passing `None` records presence with an empty value — archives and
    /// directories map to a whole tree rather than a single path.
    pub fn add(&mut self, identifier: &str, value: Option<&str>) {
        if !self.enabled {
            return;
        }
        let key = self.normalize_key(identifier);
        let stored = match value {
            Some(value) => self.normalize_value(value),
            None => String::new(),
        };
        self.entries.insert(key, stored);
        self.dirty = true;
    }

    /// Resolve an identifier to the absolute public URL recorded for it.
    pub fn get(&self, identifier: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let key = self.normalize_key(identifier);
        let value = self.entries.get(&key)?;
        Some(format!(
            "{}/{}{}",
            self.disk_url,
            self.base_path.trim_end_matches('/'),
            value
        ))
    }

    /// Flush the document to disk; a no-op unless enabled and mutated.
    ///
    /// Keys are kept sorted and the JSON is pretty-printed so successive
    /// saves diff cleanly.
    pub fn save(&mut self) -> Result<()> {
        if !self.enabled || !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let document =
            serde_json::to_string_pretty(&self.entries).context("failed to serialize cache map")?;
        fs::write(&self.file, document)
            .with_context(|| format!("failed to write {}", self.file.display()))?;
        debug!(
            "saved cache map with {} entries to {}",
            self.entries.len(),
            self.file.display()
        );
        self.dirty = false;
        Ok(())
    }

    /// Whether mutations are pending a [`CacheMap::save`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn normalize_key(&self, identifier: &str) -> String {
        let mut key = identifier;
        if !self.project_root.is_empty()
            && let Some(stripped) = key.strip_prefix(self.project_root.as_str())
        {
            key = stripped;
        }
        key.trim_matches(['/', '\\']).to_string()
    }

    fn normalize_value(&self, value: &str) -> String {
        let mut value = value;
        if let Some(stripped) = value.strip_prefix(self.disk_url.as_str()) {
            value = stripped;
        }
        let mut value = value.trim_start_matches('/');
        if let Some(stripped) = value.strip_prefix(self.base_path.trim_end_matches('/')) {
            value = stripped.trim_start_matches('/');
        }
        format!("/{value}")
    }
}

fn read_entries(file: &Path) -> BTreeMap<String, String> {
    match fs::read_to_string(file) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!("ignoring unreadable cache map {}: {err}", file.display());
            BTreeMap::new()
        }),
        Err(_) => BTreeMap::new(),
    }
}
