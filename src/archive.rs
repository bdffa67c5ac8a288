//! Archive extraction shim for bundled asset trees.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;

/// Extract the archive at `file` into `dest_dir`.
///
/// Zip archives and gzipped tarballs are supported, chosen by file
/// extension. Anything else is an error so callers can surface the archive
/// as invalid.
pub fn unpack(file: &Path, dest_dir: &Path) -> Result<()> {
    let name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if name.ends_with(".zip") {
        unpack_zip(file, dest_dir)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        unpack_tar_gz(file, dest_dir)
    } else {
        bail!("unsupported archive format: {}", file.display())
    }
}

fn unpack_zip(file: &Path, dest_dir: &Path) -> Result<()> {
    let reader = File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
    let mut archive = zip::ZipArchive::new(reader)
        .with_context(|| format!("failed to read zip archive {}", file.display()))?;
    archive
        .extract(dest_dir)
        .with_context(|| format!("failed to extract {}", file.display()))
}

fn unpack_tar_gz(file: &Path, dest_dir: &Path) -> Result<()> {
    let reader = File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive
        .unpack(dest_dir)
        .with_context(|| format!("failed to extract {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::unpack;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn unpacks_zip_archives() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("bundle.zip");

        let file = fs::File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("css/vendor.css", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"body{}").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        unpack(&archive_path, &dest).unwrap();
        assert_eq!(fs::read(dest.join("css/vendor.css")).unwrap(), b"body{}");
    }

    #[test]
    fn unpacks_gzipped_tarballs() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("bundle.tar.gz");

        let file = fs::File::create(&archive_path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let data = b"run();";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "js/vendor.js", data.as_slice()).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        unpack(&archive_path, &dest).unwrap();
        assert_eq!(fs::read(dest.join("js/vendor.js")).unwrap(), b"run();");
    }

    #[test]
    fn rejects_unknown_formats() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("bundle.rar");
        fs::write(&archive_path, b"whatever").unwrap();

        assert!(unpack(&archive_path, &dir.path().join("out")).is_err());
    }

    #[test]
    fn rejects_corrupt_archives() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("bundle.zip");
        fs::write(&archive_path, b"not a zip").unwrap();

        assert!(unpack(&archive_path, &dir.path().join("out")).is_err());
    }
}
