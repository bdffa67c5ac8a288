//! Single-file and inline-block internalization procedures.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use log::warn;
use regex::Regex;

use super::{InternalizeOutcome, InternalizeStatus, Internalizer, PipelineHit, fetch_url, is_remote};
use crate::fetch::Fetcher;
use crate::markup::Attributes;
use crate::storage::Storage;

impl<S: Storage, F: Fetcher> Internalizer<S, F> {
    /// Internalize a single stylesheet or script.
    ///
    /// Remote identifiers are downloaded, absolute local paths are copied,
    /// and anything else passes through untouched. On success the emitted
    /// output is the inclusion markup pointing at the disk's public URL; on
    /// failure the original reference is emitted instead so the page keeps
    /// working. `output` overrides the storage path derived from the
    /// identifier.
    pub fn internalize(
        &mut self,
        identifier: &str,
        attributes: &Attributes,
        output: Option<&str>,
    ) -> InternalizeOutcome {
        let path = match output {
            Some(explicit) => self.resolve(explicit),
            None => self.resolve(identifier),
        };

        match self.check_pipeline(&path, identifier) {
            Some(PipelineHit::Loaded) => {
                return InternalizeOutcome::new(InternalizeStatus::Loaded, None);
            }
            Some(PipelineHit::Cached(url)) => {
                let markup = self.render_reference(&path, &url, attributes);
                return InternalizeOutcome::new(InternalizeStatus::InCache, Some(markup));
            }
            None => {}
        }

        if let Some(outcome) = self.existing_reference(&path, identifier, attributes) {
            return outcome;
        }

        if !is_remote(identifier) && !Path::new(identifier).is_absolute() {
            // Not something we can internalize, but still renderable.
            return InternalizeOutcome::new(
                InternalizeStatus::Invalid,
                Some(identifier.to_string()),
            );
        }

        let content = match self.acquire_file(identifier) {
            Ok(content) => content,
            Err(err) => {
                warn!("failed to internalize {identifier}: {err:#}");
                let markup = self.render_reference(&path, identifier, attributes);
                return InternalizeOutcome::new(InternalizeStatus::Invalid, Some(markup));
            }
        };

        if !self.storage.put(&path, &content) {
            let markup = self.render_reference(&path, identifier, attributes);
            return InternalizeOutcome::new(InternalizeStatus::Invalid, Some(markup));
        }

        self.cache.add(identifier, Some(&path));
        let url = self.storage.url(&path);
        let markup = self.render_reference(&path, &url, attributes);
        InternalizeOutcome::new(InternalizeStatus::Internalized, Some(markup))
    }

    /// Internalize an inline code block under a logical key.
    ///
    /// The code is normalized before storage: wrapping `<script>`/`<style>`
    /// tags are removed, leading blank lines dropped, and the common
    /// indentation of the first non-blank line stripped from every line. On
    /// any failure the raw code is echoed back unchanged.
    pub fn internalize_block(
        &mut self,
        identifier: &str,
        code: &str,
        attributes: &Attributes,
    ) -> InternalizeOutcome {
        let path = self.resolve(identifier);

        match self.check_pipeline(&path, identifier) {
            Some(PipelineHit::Loaded) => {
                return InternalizeOutcome::new(InternalizeStatus::Loaded, None);
            }
            Some(PipelineHit::Cached(url)) => {
                let markup = self.render_reference(&path, &url, attributes);
                return InternalizeOutcome::new(InternalizeStatus::InCache, Some(markup));
            }
            None => {}
        }

        if let Some(outcome) = self.existing_reference(&path, identifier, attributes) {
            return outcome;
        }

        let content = normalize_block(code);
        if !self.storage.put(&path, content.as_bytes()) {
            return InternalizeOutcome::new(InternalizeStatus::Invalid, Some(code.to_string()));
        }

        self.cache.add(identifier, Some(&path));
        let url = self.storage.url(&path);
        let markup = self.render_reference(&path, &url, attributes);
        InternalizeOutcome::new(InternalizeStatus::Internalized, Some(markup))
    }

    /// Storage-existence probe shared by the file-shaped kinds: a hit emits
    /// the public URL and back-fills the cache map.
    fn existing_reference(
        &mut self,
        path: &str,
        identifier: &str,
        attributes: &Attributes,
    ) -> Option<InternalizeOutcome> {
        if !self.storage.exists(path) {
            return None;
        }
        let url = self.storage.url(path);
        self.cache.add(identifier, Some(path));
        let markup = self.render_reference(path, &url, attributes);
        Some(InternalizeOutcome::new(
            InternalizeStatus::InCache,
            Some(markup),
        ))
    }

    fn acquire_file(&self, identifier: &str) -> anyhow::Result<Vec<u8>> {
        let raw = if is_remote(identifier) {
            self.fetcher.get(&fetch_url(identifier))?
        } else {
            fs::read(identifier).with_context(|| format!("failed to read {identifier}"))?
        };
        Ok(match String::from_utf8(raw) {
            Ok(text) => strip_source_map_directives(&text).into_bytes(),
            // binary content is stored untouched
            Err(err) => err.into_bytes(),
        })
    }
}

fn source_map_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?://[#@]|/\*#)\s*sourceMappingURL=.*$")
            .expect("invalid source map regex")
    })
}

/// Remove `sourceMappingURL=` directives so the stored copy never points at
/// the original, non-internalized location.
fn strip_source_map_directives(content: &str) -> String {
    source_map_pattern().replace_all(content, "").into_owned()
}

fn block_wrapper_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)^\s*<(?:script|style)[^>]*>|</(?:script|style)>\s*$")
            .expect("invalid block wrapper regex")
    })
}

fn normalize_block(code: &str) -> String {
    let stripped = block_wrapper_pattern().replace_all(code, "");
    let mut lines: Vec<&str> = stripped.lines().collect();
    while lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    let Some(first) = lines.first() else {
        return String::new();
    };
    let prefix: String = first.chars().take_while(|c| c.is_whitespace()).collect();
    let mut normalized = lines
        .iter()
        .map(|line| line.strip_prefix(prefix.as_str()).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n");
    if stripped.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}
