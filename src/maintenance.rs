//! Administrative reset of the internalized-asset tree.

use std::fs;

use anyhow::{Context, Result, bail};
use log::info;

use crate::config::MirrorConfig;
use crate::storage::{DiskStorage, Storage};

/// Delete and recreate the internalized-asset tree and the cache-map
/// directory.
///
/// This clears everything the engine has ever materialized; the next run
/// starts from an empty disk and an absent cache map. Not an engine
/// responsibility — callers reach for it explicitly.
pub fn clear(config: &MirrorConfig) -> Result<()> {
    let storage = DiskStorage::new(&config.disk_root, &config.disk_url);
    let base = config.base_path.trim_matches('/');

    if !storage.delete_directory(base) {
        bail!("failed to delete internalized assets under {}", config.disk_root);
    }
    if !storage.make_directory(base) {
        bail!("failed to recreate internalized assets under {}", config.disk_root);
    }

    let map_file = config.cache_map_file();
    if let Some(dir) = map_file.parent() {
        if dir.exists() {
            fs::remove_dir_all(dir).with_context(|| format!("failed to delete {}", dir.display()))?;
        }
        fs::create_dir_all(dir).with_context(|| format!("failed to recreate {}", dir.display()))?;
    }

    info!("cleared internalized assets and cache map");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::clear;
    use crate::config::MirrorConfig;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn clear_resets_disk_and_cache_map() {
        let dir = tempdir().unwrap();
        let config = MirrorConfig {
            disk_root: dir.path().join("disk").to_str().unwrap().into(),
            cache_map_root: dir.path().join("maps").to_str().unwrap().into(),
            ..MirrorConfig::default()
        };

        let asset_dir = dir.path().join("disk/internalized/cdn.example.com");
        fs::create_dir_all(&asset_dir).unwrap();
        fs::write(asset_dir.join("lib.js"), b"run();").unwrap();

        let map_file = config.cache_map_file();
        fs::create_dir_all(map_file.parent().unwrap()).unwrap();
        fs::write(&map_file, "{}").unwrap();

        clear(&config).unwrap();

        let internalized = dir.path().join("disk/internalized");
        assert!(internalized.is_dir());
        assert_eq!(fs::read_dir(&internalized).unwrap().count(), 0);
        assert!(!map_file.exists());
        assert!(map_file.parent().unwrap().is_dir());
    }

    #[test]
    fn clear_succeeds_on_a_pristine_layout() {
        let dir = tempdir().unwrap();
        let config = MirrorConfig {
            disk_root: dir.path().join("disk").to_str().unwrap().into(),
            cache_map_root: dir.path().join("maps").to_str().unwrap().into(),
            ..MirrorConfig::default()
        };

        clear(&config).unwrap();
        assert!(dir.path().join("disk/internalized").is_dir());
    }
}
