//! Archive and directory internalization procedures.
//!
//! Tree-shaped assets emit no markup and record presence only in the cache
//! map; what matters is that the whole tree was materialized once.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::warn;
use tempfile::TempDir;

use super::{InternalizeOutcome, InternalizeStatus, Internalizer, PipelineHit, fetch_url, is_remote};
use crate::archive::unpack;
use crate::fetch::Fetcher;
use crate::storage::Storage;

impl<S: Storage, F: Fetcher> Internalizer<S, F> {
    /// Internalize an archive by extracting every archived file into storage
    /// under `output_dir`.
    ///
    /// The source may be a local archive or a remote one, in which case it
    /// is downloaded to a temporary location first. Temporary staging is
    /// removed on success and failure alike; no cache-map entry is written
    /// unless the whole tree landed.
    pub fn internalize_archive(
        &mut self,
        identifier: &str,
        output_dir: &str,
    ) -> InternalizeOutcome {
        let path = self.resolve(output_dir);

        match self.check_pipeline(&path, identifier) {
            Some(PipelineHit::Loaded) => {
                return InternalizeOutcome::new(InternalizeStatus::Loaded, None);
            }
            Some(PipelineHit::Cached(_)) => {
                return InternalizeOutcome::new(InternalizeStatus::InCache, None);
            }
            None => {}
        }

        if self.storage.exists(&path) {
            self.cache.add(identifier, None);
            return InternalizeOutcome::new(InternalizeStatus::InCache, None);
        }

        if let Err(err) = self.copy_archive(identifier, &path) {
            warn!("failed to internalize archive {identifier}: {err:#}");
            return InternalizeOutcome::new(InternalizeStatus::Invalid, None);
        }

        self.cache.add(identifier, None);
        InternalizeOutcome::new(InternalizeStatus::Internalized, None)
    }

    /// Internalize a local directory by copying every file under it into
    /// storage with the same relative layout.
    ///
    /// The source must exist as a real directory or the outcome is
    /// [`InternalizeStatus::Invalid`].
    pub fn internalize_directory(
        &mut self,
        source_dir: &str,
        output_dir: &str,
    ) -> InternalizeOutcome {
        let path = self.resolve(output_dir);

        match self.check_pipeline(&path, source_dir) {
            Some(PipelineHit::Loaded) => {
                return InternalizeOutcome::new(InternalizeStatus::Loaded, None);
            }
            Some(PipelineHit::Cached(_)) => {
                return InternalizeOutcome::new(InternalizeStatus::InCache, None);
            }
            None => {}
        }

        if self.storage.exists(&path) {
            self.cache.add(source_dir, None);
            return InternalizeOutcome::new(InternalizeStatus::InCache, None);
        }

        let source = Path::new(source_dir);
        if !source.is_dir() {
            warn!("cannot internalize {source_dir}: not a directory");
            return InternalizeOutcome::new(InternalizeStatus::Invalid, None);
        }

        if let Err(err) = self.copy_tree(source, &path) {
            warn!("failed to internalize directory {source_dir}: {err:#}");
            return InternalizeOutcome::new(InternalizeStatus::Invalid, None);
        }

        self.cache.add(source_dir, None);
        InternalizeOutcome::new(InternalizeStatus::Internalized, None)
    }

    fn copy_archive(&self, identifier: &str, path: &str) -> Result<()> {
        let staging = TempDir::new().context("failed to create staging directory")?;

        let archive_file: PathBuf = if is_remote(identifier) {
            let bytes = self.fetcher.get(&fetch_url(identifier))?;
            let file_name = identifier
                .rsplit('/')
                .next()
                .and_then(|name| name.split('?').next())
                .unwrap_or("download");
            let target = staging.path().join(file_name);
            fs::write(&target, bytes)
                .with_context(|| format!("failed to stage {}", target.display()))?;
            target
        } else {
            let source = PathBuf::from(identifier);
            if !source.is_file() {
                bail!("archive {identifier} does not exist");
            }
            source
        };

        let extracted = staging.path().join("extracted");
        unpack(&archive_file, &extracted)?;
        self.copy_tree(&extracted, path)
    }

    fn copy_tree(&self, source: &Path, path: &str) -> Result<()> {
        for relative in list_files_recursively(source)? {
            let file = source.join(&relative);
            let contents =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let destination = format!("{}/{}", path, relative_to_slash(&relative));
            if !self.storage.put(&destination, &contents) {
                bail!("failed to store {destination}");
            }
        }
        Ok(())
    }
}

/// Collect every file under `dir`, returned as paths relative to it.
fn list_files_recursively(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, Path::new(""), &mut files)?;
    Ok(files)
}

fn collect_files(root: &Path, relative: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let current = if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    };
    let entries =
        fs::read_dir(&current).with_context(|| format!("failed to read {}", current.display()))?;
    for entry in entries {
        let entry = entry?;
        let child = if relative.as_os_str().is_empty() {
            PathBuf::from(entry.file_name())
        } else {
            relative.join(entry.file_name())
        };
        if entry.file_type()?.is_dir() {
            collect_files(root, &child, files)?;
        } else {
            files.push(child);
        }
    }
    Ok(())
}

fn relative_to_slash(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}
