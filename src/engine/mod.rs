//! Asset internalization engine.
//!
//! One decision procedure per asset kind (single file, inline block,
//! archive, directory), all sharing a strictly ordered short-circuit
//! pipeline: loaded-set membership first, then the persistent cache map,
//! then a storage existence probe, and only then any network or filesystem
//! fetch. Repeat requests within a run cost a set lookup; repeat requests
//! across runs cost one existence check; only the very first
//! materialization pays the fetch.

mod file;
mod tree;

use log::debug;

use crate::cache_map::CacheMap;
use crate::config::{MirrorConfig, MirrorSettings};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::loaded::LoadedSet;
use crate::markup::{Attributes, link_tag, script_tag};
use crate::paths::resolve_storage_path;
use crate::storage::{DiskStorage, Storage};

/// Terminal status of one internalization attempt.
///
/// A closed set: consumers match exhaustively and must be revisited when a
/// variant is ever added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalizeStatus {
    /// The resolved path was already processed earlier in this run.
    Loaded,
    /// The asset was found via the cache map or on disk; nothing was
    /// fetched.
    InCache,
    /// The asset was freshly fetched or copied and persisted.
    Internalized,
    /// The asset could not be internalized; the original reference was
    /// emitted as a fallback.
    Invalid,
}

/// Result of one internalization attempt: the terminal status plus the
/// emitted reference, when the asset kind produces one.
#[derive(Debug, Clone)]
pub struct InternalizeOutcome {
    /// Terminal status of the attempt.
    pub status: InternalizeStatus,
    /// Inclusion markup or echoed content; `None` for tree-shaped kinds and
    /// for short-circuited repeats.
    pub output: Option<String>,
}

impl InternalizeOutcome {
    fn new(status: InternalizeStatus, output: Option<String>) -> Self {
        Self { status, output }
    }
}

/// Short-circuit result of the shared pipeline prefix.
pub(crate) enum PipelineHit {
    Loaded,
    Cached(String),
}

/// Asset internalization engine owning all per-run and persistent state.
///
/// The engine is the single context for a run: it exclusively owns the
/// loaded set and the cache-map handle, so there is no ambient state to
/// coordinate. Construct one per process or request and call
/// [`Internalizer::persist`] once the run is over.
pub struct Internalizer<S: Storage, F: Fetcher> {
    settings: MirrorSettings,
    storage: S,
    fetcher: F,
    cache: CacheMap,
    loaded: LoadedSet,
}

impl Internalizer<DiskStorage, HttpFetcher> {
    /// Wire up the production engine described by the configuration.
    pub fn from_config(config: &MirrorConfig) -> Self {
        let storage = DiskStorage::new(&config.disk_root, &config.disk_url);
        let cache = CacheMap::load(
            config.cache_map_enabled,
            config.cache_map_file(),
            &config.disk_url,
            &config.base_path,
            &config.project_root,
        );
        Self::new(config.settings(), storage, HttpFetcher::new(), cache)
    }
}

impl<S: Storage, F: Fetcher> Internalizer<S, F> {
    /// Create an engine over explicit collaborators.
    pub fn new(settings: MirrorSettings, storage: S, fetcher: F, cache: CacheMap) -> Self {
        Self {
            settings,
            storage,
            fetcher,
            cache,
            loaded: LoadedSet::new(),
        }
    }

    /// Flush the cache map when it was mutated during this run.
    pub fn persist(&mut self) -> anyhow::Result<()> {
        self.cache.save()
    }

    /// Storage paths processed so far, in insertion order.
    pub fn loaded(&self) -> &[String] {
        self.loaded.loaded()
    }

    /// Storage backend used by this engine.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) fn resolve(&self, identifier: &str) -> String {
        resolve_storage_path(
            identifier,
            &self.settings.base_path,
            &self.settings.project_root,
        )
    }

    /// Shared pipeline prefix: loaded-set check, mark-as-loaded, cache-map
    /// lookup. Marking happens before any fetch, so a failed asset is not
    /// retried within the same run.
    pub(crate) fn check_pipeline(&mut self, path: &str, identifier: &str) -> Option<PipelineHit> {
        if self.loaded.is_loaded(path) {
            return Some(PipelineHit::Loaded);
        }
        self.loaded.mark_as_loaded(path);
        if let Some(url) = self.cache.get(identifier) {
            debug!("cache map hit for {identifier}");
            return Some(PipelineHit::Cached(url));
        }
        None
    }

    /// Render the inclusion markup for an asset; stylesheets get a link
    /// tag, everything else a script tag.
    pub(crate) fn render_reference(&self, path: &str, url: &str, attributes: &Attributes) -> String {
        if path.ends_with(".css") {
            link_tag(url, attributes, &self.settings.cache_busting_token)
        } else {
            script_tag(url, attributes, &self.settings.cache_busting_token)
        }
    }
}

/// Whether an identifier refers to remote content, including
/// protocol-relative references.
pub(crate) fn is_remote(identifier: &str) -> bool {
    identifier.starts_with("http://")
        || identifier.starts_with("https://")
        || identifier.starts_with("://")
        || identifier.starts_with("//")
}

/// Normalize protocol-relative references to https before fetching.
pub(crate) fn fetch_url(identifier: &str) -> String {
    if let Some(rest) = identifier.strip_prefix("://") {
        format!("https://{rest}")
    } else if identifier.starts_with("//") {
        format!("https:{identifier}")
    } else {
        identifier.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{fetch_url, is_remote};

    #[test]
    fn recognizes_remote_identifiers() {
        assert!(is_remote("http://cdn.example.com/lib.js"));
        assert!(is_remote("https://cdn.example.com/lib.js"));
        assert!(is_remote("//cdn.example.com/lib.js"));
        assert!(is_remote("://cdn.example.com/lib.js"));
        assert!(!is_remote("/srv/app/public/lib.js"));
        assert!(!is_remote("widgets/lib.js"));
    }

    #[test]
    fn protocol_relative_references_fetch_over_https() {
        assert_eq!(
            fetch_url("//cdn.example.com/lib.js"),
            "https://cdn.example.com/lib.js"
        );
        assert_eq!(
            fetch_url("://cdn.example.com/lib.js"),
            "https://cdn.example.com/lib.js"
        );
        assert_eq!(
            fetch_url("https://cdn.example.com/lib.js"),
            "https://cdn.example.com/lib.js"
        );
    }
}
