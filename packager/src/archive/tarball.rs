//! Zstandard-compressed tarball archiver.
//!
//! Writes `<name>-<version>.tar.zst` into the output directory. Every entry
//! sits under a `<name>-<version>/` top-level directory, next to a
//! `manifest.json` that records the metadata and the SHA-256 of each payload
//! file.

use super::error::ArchiveError;
use super::{ArchiveOutput, Archiver, PayloadEntry, resolve_payload};
use crate::metadata::PackageMetadata;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;

/// File name of the manifest inside the archive.
pub const MANIFEST_NAME: &str = "manifest.json";

/// Archive file extension.
pub const ARCHIVE_EXTENSION: &str = "tar.zst";

/// A payload file recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestFile {
    /// Path inside the archive's top-level directory.
    pub path: Utf8PathBuf,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest<'a> {
    /// Package metadata, flattened into the top-level object.
    #[serde(flatten)]
    pub metadata: &'a PackageMetadata,
    /// Script paths as handed to the archiver.
    pub scripts: &'a [Utf8PathBuf],
    /// Every payload file with its digest.
    pub files: Vec<ManifestFile>,
}

/// Writes `.tar.zst` archives of the package payload.
#[derive(Debug, Clone)]
pub struct TarZstArchiver {
    package_root: Utf8PathBuf,
    output_dir: Utf8PathBuf,
}

impl TarZstArchiver {
    /// Create an archiver reading from `package_root` and writing into
    /// `output_dir`.
    #[must_use]
    pub const fn new(package_root: Utf8PathBuf, output_dir: Utf8PathBuf) -> Self {
        Self {
            package_root,
            output_dir,
        }
    }

    /// Return the path the archive for `metadata` is written to.
    #[must_use]
    pub fn archive_path(&self, metadata: &PackageMetadata) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}.{ARCHIVE_EXTENSION}", metadata.distribution_stem()))
    }
}

impl Archiver for TarZstArchiver {
    fn build(
        &self,
        metadata: &PackageMetadata,
        files: &[Utf8PathBuf],
    ) -> Result<ArchiveOutput, ArchiveError> {
        let payload = resolve_payload(&self.package_root, metadata, files)?;
        let manifest = Manifest {
            metadata,
            scripts: files,
            files: manifest_files(&payload)?,
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)?;

        fs::create_dir_all(&self.output_dir)?;
        let archive_path = self.archive_path(metadata);
        create_archive(
            &archive_path,
            Utf8Path::new(&metadata.distribution_stem()),
            &payload,
            &manifest_json,
        )?;
        info!("wrote {archive_path} ({} files)", payload.len());

        Ok(ArchiveOutput {
            archive_path: Some(archive_path),
            files: payload.into_iter().map(|entry| entry.name).collect(),
        })
    }
}

fn manifest_files(payload: &[PayloadEntry]) -> Result<Vec<ManifestFile>, ArchiveError> {
    let mut files = Vec::with_capacity(payload.len());
    for entry in payload {
        files.push(ManifestFile {
            path: entry.name.clone(),
            sha256: compute_sha256(&entry.source)?,
        });
    }
    Ok(files)
}

/// Compute the lowercase hex SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`ArchiveError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<String, ArchiveError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write the payload and manifest into a `.tar.zst` at `output_path`.
///
/// Entries are placed under `prefix`. Symlinks are followed, so linked
/// directories contribute their target files.
///
/// # Errors
///
/// Returns [`ArchiveError::Io`] if a payload file cannot be read or the
/// archive cannot be written.
pub fn create_archive(
    output_path: &Utf8Path,
    prefix: &Utf8Path,
    payload: &[PayloadEntry],
    manifest_json: &[u8],
) -> Result<(), ArchiveError> {
    let output_file = fs::File::create(output_path)?;
    let zstd_encoder = zstd::Encoder::new(output_file, 0)?.auto_finish();
    let mut archive = tar::Builder::new(zstd_encoder);
    archive.follow_symlinks(true);

    for entry in payload {
        archive.append_path_with_name(&entry.source, prefix.join(&entry.name))?;
    }

    let mut header = tar::Header::new_gnu();
    header.set_size(manifest_json.len() as u64);
    header.set_mode(0o644);
    archive.append_data(&mut header, prefix.join(MANIFEST_NAME), manifest_json)?;

    archive.finish()?;
    Ok(())
}

#[cfg(test)]
#[path = "tarball_tests.rs"]
mod tests;
